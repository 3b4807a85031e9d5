//! Contract model: the declarative endpoint map and its resolver.
//!
//! A contract is a tree of named nodes. Each node is either a leaf
//! endpoint definition or a nested group; the discriminant is set once at
//! construction time rather than re-derived from shape on every access.

use crate::context::Method;
use crate::error::{Error, Result};
use crate::schema::{describe_validator, Validator};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// One API operation: path template, method, optional validators.
///
/// Immutable once built; the client only reads it.
#[derive(Clone)]
pub struct Endpoint {
    pub path: String,
    pub method: Method,
    pub request: Option<Arc<dyn Validator>>,
    pub response: Option<Arc<dyn Validator>>,
}

impl Endpoint {
    /// Create an endpoint with the given method and path template.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            method,
            request: None,
            response: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::Patch, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    /// Attach a request validator.
    pub fn request(mut self, validator: impl Validator + 'static) -> Self {
        self.request = Some(Arc::new(validator));
        self
    }

    /// Attach a response validator.
    pub fn response(mut self, validator: impl Validator + 'static) -> Self {
        self.response = Some(Arc::new(validator));
        self
    }

    /// Human-oriented description of this endpoint.
    pub fn describe(&self, key: &str) -> EndpointDescription {
        EndpointDescription {
            key: key.to_string(),
            method: self.method,
            path: self.path.clone(),
            request: describe_validator(self.request.as_deref()),
            response: describe_validator(self.response.as_deref()),
        }
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("path", &self.path)
            .field("method", &self.method)
            .field("request", &self.request.as_ref().map(|_| "<Validator>"))
            .field("response", &self.response.as_ref().map(|_| "<Validator>"))
            .finish()
    }
}

/// A contract node: a leaf operation or a nested group.
#[derive(Debug, Clone)]
pub enum ContractNode {
    Endpoint(Endpoint),
    Group(Contract),
}

/// The declarative map of endpoints defining an API surface.
///
/// Keys map to endpoints or nested contracts at arbitrary depth. Lookups
/// use dotted keys: `"users.get"` resolves through the `users` group.
#[derive(Debug, Clone, Default)]
pub struct Contract {
    entries: BTreeMap<String, ContractNode>,
}

impl Contract {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a leaf endpoint under the given key.
    pub fn endpoint(mut self, key: impl Into<String>, endpoint: Endpoint) -> Self {
        self.entries
            .insert(key.into(), ContractNode::Endpoint(endpoint));
        self
    }

    /// Add a nested contract under the given key.
    pub fn group(mut self, key: impl Into<String>, contract: Contract) -> Self {
        self.entries
            .insert(key.into(), ContractNode::Group(contract));
        self
    }

    /// Look up a direct child node.
    pub fn get(&self, key: &str) -> Option<&ContractNode> {
        self.entries.get(key)
    }

    /// Iterate over direct children.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ContractNode)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Resolve a dotted key to a node, walking nested groups.
    pub fn node(&self, key: &str) -> Result<&ContractNode> {
        if key.is_empty() {
            return Err(Error::Config("empty endpoint key".to_string()));
        }

        let mut current = self;
        let mut segments = key.split('.').peekable();

        loop {
            let segment = match segments.next() {
                Some(s) => s,
                None => break,
            };
            if segment.is_empty() {
                return Err(Error::Config(format!("malformed endpoint key `{key}`")));
            }

            let node = current
                .entries
                .get(segment)
                .ok_or_else(|| Error::Config(format!("unknown endpoint key `{key}`")))?;

            if segments.peek().is_none() {
                return Ok(node);
            }

            match node {
                ContractNode::Group(sub) => current = sub,
                ContractNode::Endpoint(_) => {
                    return Err(Error::Config(format!(
                        "key `{key}` traverses through endpoint `{segment}`"
                    )));
                }
            }
        }

        Err(Error::Config(format!("unknown endpoint key `{key}`")))
    }

    /// Resolve a dotted key to a leaf endpoint.
    pub fn resolve(&self, key: &str) -> Result<&Endpoint> {
        match self.node(key)? {
            ContractNode::Endpoint(endpoint) => Ok(endpoint),
            ContractNode::Group(_) => Err(Error::Config(format!(
                "key `{key}` refers to a group, not an endpoint"
            ))),
        }
    }

    /// Resolve a dotted key to a nested group.
    pub fn resolve_group(&self, key: &str) -> Result<&Contract> {
        match self.node(key)? {
            ContractNode::Group(group) => Ok(group),
            ContractNode::Endpoint(_) => Err(Error::Config(format!(
                "key `{key}` refers to an endpoint, not a group"
            ))),
        }
    }

    /// Top-level endpoint keys, excluding group keys.
    pub fn endpoint_keys(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter_map(|(k, node)| match node {
                ContractNode::Endpoint(_) => Some(k.as_str()),
                ContractNode::Group(_) => None,
            })
            .collect()
    }

    /// Request/response validators for the endpoint at a dotted key.
    #[allow(clippy::type_complexity)]
    pub fn schema(
        &self,
        key: &str,
    ) -> Result<(Option<Arc<dyn Validator>>, Option<Arc<dyn Validator>>)> {
        let endpoint = self.resolve(key)?;
        Ok((endpoint.request.clone(), endpoint.response.clone()))
    }

    /// Human-oriented description of the endpoint at a dotted key.
    pub fn describe(&self, key: &str) -> Result<EndpointDescription> {
        Ok(self.resolve(key)?.describe(key))
    }

    /// Flatten the whole tree into `(dotted key, endpoint)` pairs.
    pub fn flatten(&self) -> Vec<(String, Endpoint)> {
        let mut out = Vec::new();
        self.flatten_into("", &mut out);
        out
    }

    fn flatten_into(&self, prefix: &str, out: &mut Vec<(String, Endpoint)>) {
        for (key, node) in &self.entries {
            let full = if prefix.is_empty() {
                key.clone()
            } else {
                format!("{prefix}.{key}")
            };
            match node {
                ContractNode::Endpoint(endpoint) => out.push((full, endpoint.clone())),
                ContractNode::Group(sub) => sub.flatten_into(&full, out),
            }
        }
    }
}

/// Documentation-oriented rendering of one endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointDescription {
    pub key: String,
    pub method: Method,
    pub path: String,
    pub request: String,
    pub response: String,
}

impl fmt::Display for EndpointDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} {} {}", self.key, self.method, self.path)?;
        writeln!(f, "  request: {}", self.request)?;
        write!(f, "  response: {}", self.response)
    }
}
