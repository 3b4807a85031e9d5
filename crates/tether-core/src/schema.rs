//! Validator contract and the built-in schema engine.
//!
//! The client core only depends on the [`Validator`] trait, so any
//! external validation engine can be plugged in. The [`Schema`] enum is a
//! small built-in engine covering the common JSON shapes, and the one the
//! introspection facility knows how to render.

use crate::error::{Error, Issue, Result, ValidationKind};
use serde_json::Value;
use std::fmt;

/// An opaque schema validator.
///
/// `validate` returns the validated (possibly coerced) value, or the
/// structured list of issues found. `shape` is a best-effort description
/// of the validator's structure for documentation; engines that cannot be
/// introspected fall back to the default `Unknown`.
pub trait Validator: Send + Sync {
    fn validate(&self, value: &Value) -> std::result::Result<Value, Vec<Issue>>;

    fn shape(&self) -> SchemaShape {
        SchemaShape::Unknown
    }
}

/// Run a value through an optional validator.
///
/// Absence of a validator is a pass-through: the value is returned
/// unchanged. Failures are normalized into [`Error::Validation`] tagged
/// with the given kind. Callers that want non-raising control flow just
/// inspect the returned `Result`.
pub fn validate_with(
    validator: Option<&dyn Validator>,
    kind: ValidationKind,
    value: Value,
) -> Result<Value> {
    match validator {
        None => Ok(value),
        Some(v) => v
            .validate(&value)
            .map_err(|issues| Error::Validation { kind, issues }),
    }
}

/// Introspectable description of a validator's structure.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaShape {
    String,
    Number,
    Integer,
    Boolean,
    Array(Box<SchemaShape>),
    Optional(Box<SchemaShape>),
    Object(Vec<(String, SchemaShape)>),
    Unknown,
}

impl fmt::Display for SchemaShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaShape::String => f.write_str("string"),
            SchemaShape::Number => f.write_str("number"),
            SchemaShape::Integer => f.write_str("integer"),
            SchemaShape::Boolean => f.write_str("boolean"),
            SchemaShape::Array(inner) => write!(f, "{}[]", inner),
            SchemaShape::Optional(inner) => write!(f, "{}?", inner),
            SchemaShape::Object(fields) => {
                f.write_str("{ ")?;
                for (i, (name, shape)) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", name, shape)?;
                }
                f.write_str(" }")
            }
            SchemaShape::Unknown => f.write_str("unknown"),
        }
    }
}

/// Render an optional validator for documentation.
///
/// Absent validators render as `void`, distinct from `unknown` (a present
/// validator whose internals cannot be introspected).
pub fn describe_validator(validator: Option<&dyn Validator>) -> String {
    match validator {
        None => "void".to_string(),
        Some(v) => v.shape().to_string(),
    }
}

/// Built-in JSON schema engine.
///
/// Object fields are required unless wrapped in `Optional`; extra fields
/// not named by the schema pass through untouched.
#[derive(Debug, Clone)]
pub enum Schema {
    String,
    Number,
    Integer,
    Boolean,
    Array(Box<Schema>),
    Optional(Box<Schema>),
    Object(Vec<(String, Schema)>),
    /// Accepts anything.
    Unknown,
}

impl Schema {
    /// Object schema from field pairs.
    pub fn object(fields: Vec<(&str, Schema)>) -> Self {
        Schema::Object(
            fields
                .into_iter()
                .map(|(name, schema)| (name.to_string(), schema))
                .collect(),
        )
    }

    /// Array of the given element schema.
    pub fn array(element: Schema) -> Self {
        Schema::Array(Box::new(element))
    }

    /// Optional wrapper: null or absent is accepted.
    pub fn optional(inner: Schema) -> Self {
        Schema::Optional(Box::new(inner))
    }

    fn check(&self, value: &Value, path: &mut Vec<String>, issues: &mut Vec<Issue>) {
        match self {
            Schema::String => {
                if !value.is_string() {
                    issues.push(Issue::new(path.clone(), expected("string", value)));
                }
            }
            Schema::Number => {
                if !value.is_number() {
                    issues.push(Issue::new(path.clone(), expected("number", value)));
                }
            }
            Schema::Integer => {
                if !value.is_i64() && !value.is_u64() {
                    issues.push(Issue::new(path.clone(), expected("integer", value)));
                }
            }
            Schema::Boolean => {
                if !value.is_boolean() {
                    issues.push(Issue::new(path.clone(), expected("boolean", value)));
                }
            }
            Schema::Array(element) => match value {
                Value::Array(items) => {
                    for (i, item) in items.iter().enumerate() {
                        path.push(i.to_string());
                        element.check(item, path, issues);
                        path.pop();
                    }
                }
                other => issues.push(Issue::new(path.clone(), expected("array", other))),
            },
            Schema::Optional(inner) => {
                if !value.is_null() {
                    inner.check(value, path, issues);
                }
            }
            Schema::Object(fields) => match value {
                Value::Object(map) => {
                    for (name, schema) in fields {
                        path.push(name.clone());
                        match map.get(name) {
                            Some(field_value) => schema.check(field_value, path, issues),
                            None => {
                                if !matches!(schema, Schema::Optional(_)) {
                                    issues.push(Issue::new(
                                        path.clone(),
                                        "required field missing".to_string(),
                                    ));
                                }
                            }
                        }
                        path.pop();
                    }
                }
                other => issues.push(Issue::new(path.clone(), expected("object", other))),
            },
            Schema::Unknown => {}
        }
    }
}

impl Validator for Schema {
    fn validate(&self, value: &Value) -> std::result::Result<Value, Vec<Issue>> {
        let mut issues = Vec::new();
        let mut path = Vec::new();
        self.check(value, &mut path, &mut issues);
        if issues.is_empty() {
            Ok(value.clone())
        } else {
            Err(issues)
        }
    }

    fn shape(&self) -> SchemaShape {
        match self {
            Schema::String => SchemaShape::String,
            Schema::Number => SchemaShape::Number,
            Schema::Integer => SchemaShape::Integer,
            Schema::Boolean => SchemaShape::Boolean,
            Schema::Array(inner) => SchemaShape::Array(Box::new(inner.shape())),
            Schema::Optional(inner) => SchemaShape::Optional(Box::new(inner.shape())),
            Schema::Object(fields) => SchemaShape::Object(
                fields
                    .iter()
                    .map(|(name, schema)| (name.clone(), schema.shape()))
                    .collect(),
            ),
            Schema::Unknown => SchemaShape::Unknown,
        }
    }
}

fn expected(kind: &str, got: &Value) -> String {
    format!("expected {}, got {}", kind, type_name(got))
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_absent_validator_is_pass_through() {
        let value = json!({"anything": true});
        let out = validate_with(None, ValidationKind::Request, value.clone()).unwrap();
        assert_eq!(out, value);
    }

    #[test]
    fn test_object_schema_accepts_valid_data() {
        let schema = Schema::object(vec![
            ("id", Schema::String),
            ("age", Schema::optional(Schema::Integer)),
        ]);

        let out = schema.validate(&json!({"id": "u1", "age": 30})).unwrap();
        assert_eq!(out, json!({"id": "u1", "age": 30}));

        // Optional field may be absent or null
        assert!(schema.validate(&json!({"id": "u1"})).is_ok());
        assert!(schema.validate(&json!({"id": "u1", "age": null})).is_ok());
    }

    #[test]
    fn test_object_schema_reports_issues_with_paths() {
        let schema = Schema::object(vec![
            ("id", Schema::String),
            ("tags", Schema::array(Schema::String)),
        ]);

        let issues = schema
            .validate(&json!({"id": 1, "tags": ["ok", 2]}))
            .unwrap_err();

        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].path, vec!["id"]);
        assert_eq!(issues[1].path, vec!["tags", "1"]);
    }

    #[test]
    fn test_missing_required_field() {
        let schema = Schema::object(vec![("id", Schema::String)]);
        let issues = schema.validate(&json!({})).unwrap_err();
        assert_eq!(issues[0].path, vec!["id"]);
        assert_eq!(issues[0].message, "required field missing");
    }

    #[test]
    fn test_extra_fields_pass_through() {
        let schema = Schema::object(vec![("id", Schema::String)]);
        let out = schema.validate(&json!({"id": "u1", "extra": 1})).unwrap();
        assert_eq!(out, json!({"id": "u1", "extra": 1}));
    }

    #[test]
    fn test_validate_with_tags_the_kind() {
        let schema = Schema::String;
        let err = validate_with(Some(&schema), ValidationKind::Response, json!(5)).unwrap_err();
        match err {
            Error::Validation { kind, issues } => {
                assert_eq!(kind, ValidationKind::Response);
                assert_eq!(issues.len(), 1);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_shape_rendering() {
        let schema = Schema::object(vec![
            ("id", Schema::String),
            ("age", Schema::optional(Schema::Integer)),
            ("tags", Schema::array(Schema::String)),
        ]);
        assert_eq!(
            schema.shape().to_string(),
            "{ id: string, age: integer?, tags: string[] }"
        );

        assert_eq!(Schema::Unknown.shape().to_string(), "unknown");
        assert_eq!(describe_validator(None), "void");
    }
}
