//! Normalized request/response descriptions flowing through the pipeline.

use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;

/// HTTP methods supported by endpoint definitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
}

impl Method {
    /// Parse an HTTP method from a string, case-insensitive.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "GET" => Some(Method::Get),
            "POST" => Some(Method::Post),
            "PUT" => Some(Method::Put),
            "DELETE" => Some(Method::Delete),
            "PATCH" => Some(Method::Patch),
            "HEAD" => Some(Method::Head),
            "OPTIONS" => Some(Method::Options),
            _ => None,
        }
    }

    /// Convert to string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Patch => "PATCH",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
        }
    }

    /// Whether invocations with this method carry a JSON body.
    ///
    /// GET, HEAD and DELETE requests never do.
    pub fn requires_body(&self) -> bool {
        !matches!(self, Method::Get | Method::Head | Method::Delete)
    }

    /// Convert to the `http` crate's method type.
    pub fn as_http(&self) -> http::Method {
        match self {
            Method::Get => http::Method::GET,
            Method::Post => http::Method::POST,
            Method::Put => http::Method::PUT,
            Method::Delete => http::Method::DELETE,
            Method::Patch => http::Method::PATCH,
            Method::Head => http::Method::HEAD,
            Method::Options => http::Method::OPTIONS,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One in-flight request's normalized description.
///
/// Created fresh per call by the client core and handed through the
/// middleware chain. Middleware that wants to mutate the request clones
/// it and passes the copy to `next`.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Relative (or absolute) URL including any query string.
    pub url: String,
    pub method: Method,
    pub headers: HashMap<String, String>,
    /// JSON body for body-bearing methods.
    pub body: Option<Value>,
    /// Resolved path parameters, kept for diagnostics and cache keys.
    pub params: HashMap<String, String>,
    /// Query parameters; values may be scalars or arrays.
    pub query: Map<String, Value>,
}

impl RequestContext {
    /// Create a bare request with the given method and URL.
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method,
            headers: HashMap::new(),
            body: None,
            params: HashMap::new(),
            query: Map::new(),
        }
    }

    /// Set a header, returning the modified context.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Set the body, returning the modified context.
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// A completed exchange's normalized result.
#[derive(Debug, Clone)]
pub struct ResponseContext {
    pub status: u16,
    pub status_text: String,
    pub headers: HashMap<String, String>,
    /// Already body-parsed payload (JSON-decoded when possible).
    pub data: Value,
}

impl ResponseContext {
    /// Create a response with the given status and data.
    pub fn new(status: u16, status_text: impl Into<String>, data: Value) -> Self {
        Self {
            status,
            status_text: status_text.into(),
            headers: HashMap::new(),
            data,
        }
    }

    /// Whether the status is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_from_str() {
        assert_eq!(Method::from_str("GET"), Some(Method::Get));
        assert_eq!(Method::from_str("post"), Some(Method::Post));
        assert_eq!(Method::from_str("Options"), Some(Method::Options));
        assert_eq!(Method::from_str("INVALID"), None);
    }

    #[test]
    fn test_requires_body() {
        assert!(!Method::Get.requires_body());
        assert!(!Method::Head.requires_body());
        assert!(!Method::Delete.requires_body());
        assert!(Method::Post.requires_body());
        assert!(Method::Put.requires_body());
        assert!(Method::Patch.requires_body());
        assert!(Method::Options.requires_body());
    }

    #[test]
    fn test_response_is_success() {
        assert!(ResponseContext::new(200, "OK", Value::Null).is_success());
        assert!(ResponseContext::new(204, "No Content", Value::Null).is_success());
        assert!(!ResponseContext::new(301, "Moved Permanently", Value::Null).is_success());
        assert!(!ResponseContext::new(404, "Not Found", Value::Null).is_success());
    }
}
