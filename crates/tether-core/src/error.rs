//! Error taxonomy shared by every Tether component.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::time::Duration;

/// One schema-validation failure inside a value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// Path to the offending location within the data (empty = root).
    pub path: Vec<String>,
    /// Human-readable reason.
    pub message: String,
}

impl Issue {
    /// Create an issue at the given path.
    pub fn new(path: Vec<String>, message: impl Into<String>) -> Self {
        Self {
            path,
            message: message.into(),
        }
    }

    /// Create an issue at the root of the value.
    pub fn root(message: impl Into<String>) -> Self {
        Self::new(Vec::new(), message)
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.path.join("."), self.message)
        }
    }
}

/// Which side of the exchange a validation failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationKind {
    Request,
    Response,
}

impl ValidationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationKind::Request => "request",
            ValidationKind::Response => "response",
        }
    }
}

impl fmt::Display for ValidationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tether error type.
///
/// This is the closed set of failures that may cross any component
/// boundary. Anything raised by an underlying transport library must be
/// translated into one of these variants at the transport adapter.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{kind} validation failed: {}", format_issues(.issues))]
    Validation {
        kind: ValidationKind,
        issues: Vec<Issue>,
    },

    #[error("HTTP {status} {status_text}")]
    Http {
        status: u16,
        status_text: String,
        /// Already body-parsed response payload, when one was readable.
        body: Option<Value>,
    },

    #[error("network error: {message}")]
    Network { message: String },

    #[error("request timed out after {timeout:?}")]
    Timeout { timeout: Duration },

    #[error("configuration error: {0}")]
    Config(String),
}

/// Result alias used across the workspace.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Stable string code for programmatic dispatch.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Validation { .. } => "VALIDATION_ERROR",
            Error::Http { .. } => "HTTP_ERROR",
            Error::Network { .. } => "NETWORK_ERROR",
            Error::Timeout { .. } => "TIMEOUT_ERROR",
            Error::Config(_) => "CONFIG_ERROR",
        }
    }

    /// Build a request-side validation error.
    pub fn request_validation(issues: Vec<Issue>) -> Self {
        Error::Validation {
            kind: ValidationKind::Request,
            issues,
        }
    }

    /// Build a response-side validation error.
    pub fn response_validation(issues: Vec<Issue>) -> Self {
        Error::Validation {
            kind: ValidationKind::Response,
            issues,
        }
    }

    /// Build a network error from any underlying failure.
    pub fn network(message: impl Into<String>) -> Self {
        Error::Network {
            message: message.into(),
        }
    }
}

fn format_issues(issues: &[Issue]) -> String {
    issues
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_stable() {
        assert_eq!(
            Error::request_validation(vec![Issue::root("bad")]).code(),
            "VALIDATION_ERROR"
        );
        assert_eq!(
            Error::Http {
                status: 404,
                status_text: "Not Found".to_string(),
                body: None,
            }
            .code(),
            "HTTP_ERROR"
        );
        assert_eq!(Error::network("refused").code(), "NETWORK_ERROR");
        assert_eq!(
            Error::Timeout {
                timeout: Duration::from_secs(5)
            }
            .code(),
            "TIMEOUT_ERROR"
        );
        assert_eq!(Error::Config("bad url".to_string()).code(), "CONFIG_ERROR");
    }

    #[test]
    fn test_validation_message_aggregates_issues() {
        let err = Error::request_validation(vec![
            Issue::new(vec!["id".to_string()], "expected string"),
            Issue::new(
                vec!["tags".to_string(), "0".to_string()],
                "expected string",
            ),
        ]);

        let msg = err.to_string();
        assert!(msg.contains("request validation failed"));
        assert!(msg.contains("id: expected string"));
        assert!(msg.contains("tags.0: expected string"));
    }

    #[test]
    fn test_http_error_display() {
        let err = Error::Http {
            status: 503,
            status_text: "Service Unavailable".to_string(),
            body: Some(serde_json::json!({"reason": "overloaded"})),
        };
        assert_eq!(err.to_string(), "HTTP 503 Service Unavailable");
    }
}
