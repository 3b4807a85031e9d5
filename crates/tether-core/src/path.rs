//! Pure helpers for path templates, query strings and URL assembly.
//!
//! Path templates mark parameters with a `:` sigil: `/users/:id/posts`.
//! A parameter name runs from the sigil to the next `/` or the end of the
//! template.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Everything except RFC 3986 unreserved characters gets escaped.
const COMPONENT_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, COMPONENT_ENCODE_SET).to_string()
}

/// Extract parameter names from a path template.
///
/// Preserves order of first occurrence; duplicate names are preserved,
/// not deduplicated.
pub fn extract_param_names(path: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut rest = path;

    while let Some(pos) = rest.find(':') {
        let after = &rest[pos + 1..];
        let end = after.find('/').unwrap_or(after.len());
        let name = &after[..end];
        if !name.is_empty() {
            names.push(name.to_string());
        }
        rest = &after[end..];
    }

    names
}

/// Substitute named parameters into a path template.
///
/// Every occurrence of `:name` with a matching entry is replaced with the
/// percent-encoded value; names without an entry are left as-is.
pub fn substitute(path: &str, params: &HashMap<String, String>) -> String {
    let mut out = String::with_capacity(path.len());
    let mut rest = path;

    while let Some(pos) = rest.find(':') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];
        let end = after.find('/').unwrap_or(after.len());
        let name = &after[..end];
        match params.get(name) {
            Some(value) => out.push_str(&encode_component(value)),
            None => {
                out.push(':');
                out.push_str(name);
            }
        }
        rest = &after[end..];
    }

    out.push_str(rest);
    out
}

/// Build a query string from a parameter map.
///
/// Null values are skipped; array values append one entry per element
/// under the same key. Returns `""` when no entries exist, otherwise a
/// string beginning with `?`.
pub fn build_query_string(params: &Map<String, Value>) -> String {
    let mut parts = Vec::new();

    for (key, value) in params {
        match value {
            Value::Null => {}
            Value::Array(items) => {
                for item in items {
                    if !item.is_null() {
                        parts.push(format!(
                            "{}={}",
                            encode_component(key),
                            encode_component(&stringify(item))
                        ));
                    }
                }
            }
            other => parts.push(format!(
                "{}={}",
                encode_component(key),
                encode_component(&stringify(other))
            )),
        }
    }

    if parts.is_empty() {
        String::new()
    } else {
        format!("?{}", parts.join("&"))
    }
}

/// Build a relative URL from a resolved path and an optional query string.
///
/// The path is forced to begin with `/`.
pub fn build_url(path: &str, query: &str) -> String {
    if path.starts_with('/') {
        format!("{}{}", path, query)
    } else {
        format!("/{}{}", path, query)
    }
}

/// Split input data into path parameters and the remainder.
///
/// Keys named by the template become path parameters (stringified);
/// everything else is destined for the query string or body depending on
/// the method. Null or non-object data yields two empty maps.
pub fn split_params(
    path: &str,
    data: Option<&Value>,
) -> (HashMap<String, String>, Map<String, Value>) {
    let mut path_params = HashMap::new();
    let mut remainder = Map::new();

    let object = match data {
        Some(Value::Object(map)) => map,
        _ => return (path_params, remainder),
    };

    let names = extract_param_names(path);
    for (key, value) in object {
        if names.iter().any(|n| n == key) {
            path_params.insert(key.clone(), stringify(value));
        } else {
            remainder.insert(key.clone(), value.clone());
        }
    }

    (path_params, remainder)
}

/// Render a JSON value as a bare string for use in a path or query entry.
fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
