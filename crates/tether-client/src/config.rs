//! Client configuration.

use crate::middleware::Middleware;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tether_core::{Error, Result};
use tether_transport::{validate_base_url, Transport};

/// Where requests go: a base address for the default hyper adapter, or a
/// pre-built transport handle.
#[derive(Clone)]
pub enum Target {
    BaseUrl(String),
    Transport(Arc<dyn Transport>),
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::BaseUrl(url) => f.debug_tuple("BaseUrl").field(url).finish(),
            Target::Transport(t) => f.debug_tuple("Transport").field(&t.name()).finish(),
        }
    }
}

/// Caller-facing configuration for [`crate::Client`].
///
/// Normalized into an internal copy at client construction; invalid
/// settings surface there as `Error::Config`.
#[derive(Default)]
pub struct ClientConfig {
    target: Option<Target>,
    validate_request: Option<bool>,
    validate_response: Option<bool>,
    default_headers: HashMap<String, String>,
    timeout: Option<Duration>,
    middleware: Vec<Arc<dyn Middleware>>,
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Target the default hyper transport at a base address.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.target = Some(Target::BaseUrl(url.into()));
        self
    }

    /// Inject a pre-built transport handle.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.target = Some(Target::Transport(transport));
        self
    }

    /// Toggle request validation (default true).
    pub fn validate_request(mut self, enabled: bool) -> Self {
        self.validate_request = Some(enabled);
        self
    }

    /// Toggle response validation (default true).
    pub fn validate_response(mut self, enabled: bool) -> Self {
        self.validate_response = Some(enabled);
        self
    }

    /// Add a default header sent with every request.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.insert(name.into(), value.into());
        self
    }

    /// Per-request time budget for the default transport.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Append a middleware to the ordered list (first added = outermost).
    pub fn middleware<M: Middleware + 'static>(mut self, middleware: M) -> Self {
        self.middleware.push(Arc::new(middleware));
        self
    }

    pub(crate) fn into_internal(self) -> Result<InternalClientConfig> {
        let target = self
            .target
            .ok_or_else(|| Error::Config("no transport target configured".to_string()))?;

        if let Target::BaseUrl(url) = &target {
            validate_base_url(url)?;
        }
        if self.timeout == Some(Duration::ZERO) {
            return Err(Error::Config("timeout must be non-zero".to_string()));
        }

        Ok(InternalClientConfig {
            target,
            validate_request: self.validate_request.unwrap_or(true),
            validate_response: self.validate_response.unwrap_or(true),
            default_headers: self.default_headers,
            timeout: self.timeout,
            middleware: self.middleware,
        })
    }
}

/// Defaults-applied configuration owned by the client.
pub(crate) struct InternalClientConfig {
    pub target: Target,
    pub validate_request: bool,
    pub validate_response: bool,
    pub default_headers: HashMap<String, String>,
    pub timeout: Option<Duration>,
    pub middleware: Vec<Arc<dyn Middleware>>,
}

impl fmt::Debug for InternalClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InternalClientConfig")
            .field("target", &self.target)
            .field("validate_request", &self.validate_request)
            .field("validate_response", &self.validate_response)
            .field("default_headers", &self.default_headers)
            .field("timeout", &self.timeout)
            .field("middleware", &self.middleware.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_applied() {
        let internal = ClientConfig::new()
            .base_url("http://localhost:8080")
            .into_internal()
            .unwrap();

        assert!(internal.validate_request);
        assert!(internal.validate_response);
        assert!(internal.default_headers.is_empty());
        assert!(internal.middleware.is_empty());
        assert_eq!(internal.timeout, None);
    }

    #[test]
    fn test_internal_config_debug() {
        let internal = ClientConfig::new()
            .base_url("http://localhost:8080")
            .into_internal()
            .unwrap();
        let rendered = format!("{internal:?}");
        assert!(rendered.contains("BaseUrl"));
        assert!(rendered.contains("validate_request: true"));
    }

    #[test]
    fn test_missing_target_is_config_error() {
        let err = ClientConfig::new().into_internal().unwrap_err();
        assert_eq!(err.code(), "CONFIG_ERROR");
    }

    #[test]
    fn test_malformed_base_url_is_config_error() {
        let err = ClientConfig::new()
            .base_url("not a url")
            .into_internal()
            .unwrap_err();
        assert_eq!(err.code(), "CONFIG_ERROR");
    }

    #[test]
    fn test_zero_timeout_is_config_error() {
        let err = ClientConfig::new()
            .base_url("http://localhost:8080")
            .timeout(Duration::ZERO)
            .into_internal()
            .unwrap_err();
        assert_eq!(err.code(), "CONFIG_ERROR");
    }

    #[test]
    fn test_validation_toggles() {
        let internal = ClientConfig::new()
            .base_url("http://localhost:8080")
            .validate_request(false)
            .validate_response(false)
            .into_internal()
            .unwrap();
        assert!(!internal.validate_request);
        assert!(!internal.validate_response);
    }
}
