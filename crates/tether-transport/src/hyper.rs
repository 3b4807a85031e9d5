//! Transport adapter backed by hyper's pooled legacy client.

use bytes::Bytes;
use http::Request;
use http_body_util::{BodyExt, Full};
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;
use serde_json::Value;
use std::time::Duration;
use tether_core::{Error, RequestContext, ResponseContext, Result};
use tracing::debug;

use crate::{BoxFuture, Transport};

/// Configuration for [`HyperTransport`].
#[derive(Debug, Clone)]
pub struct HyperTransportConfig {
    /// Base address every relative request URL is joined onto.
    pub base_url: String,
    /// Per-request time budget (None = no timeout).
    pub timeout: Option<Duration>,
    /// Connection pool idle timeout.
    pub pool_idle_timeout: Duration,
    /// Max idle connections per host.
    pub pool_max_idle_per_host: usize,
}

impl HyperTransportConfig {
    /// Default configuration for the given base address.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Some(Duration::from_secs(30)),
            pool_idle_timeout: Duration::from_secs(90),
            pool_max_idle_per_host: 32,
        }
    }

    /// Set the per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Disable the per-request timeout.
    pub fn no_timeout(mut self) -> Self {
        self.timeout = None;
        self
    }
}

/// Transport adapter over a pooled hyper client.
pub struct HyperTransport {
    base_url: String,
    timeout: Option<Duration>,
    client: Client<HttpConnector, Full<Bytes>>,
}

impl std::fmt::Debug for HyperTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyperTransport")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl HyperTransport {
    /// Create a transport for the given base address with defaults.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_config(HyperTransportConfig::new(base_url))
    }

    /// Create a transport with custom configuration.
    pub fn with_config(config: HyperTransportConfig) -> Result<Self> {
        let base_url = validate_base_url(&config.base_url)?;
        if config.timeout == Some(Duration::ZERO) {
            return Err(Error::Config("timeout must be non-zero".to_string()));
        }

        let mut builder = Client::builder(TokioExecutor::new());
        builder.pool_idle_timeout(config.pool_idle_timeout);
        builder.pool_max_idle_per_host(config.pool_max_idle_per_host);

        Ok(Self {
            base_url,
            timeout: config.timeout,
            client: builder.build_http(),
        })
    }

    async fn perform(&self, request: RequestContext) -> Result<ResponseContext> {
        let url = join_url(&self.base_url, &request.url);
        debug!(method = %request.method, %url, "dispatching request");

        let mut builder = Request::builder()
            .method(request.method.as_http())
            .uri(&url);
        let has_content_type = request
            .headers
            .keys()
            .any(|k| k.eq_ignore_ascii_case("content-type"));
        if !has_content_type {
            builder = builder.header("Content-Type", "application/json");
        }
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }

        let body = encode_body(&request)?;
        let req = builder
            .body(Full::new(body))
            .map_err(|e| Error::network(format!("failed to build request: {e}")))?;

        let exchange = async {
            let resp = self
                .client
                .request(req)
                .await
                .map_err(|e| Error::network(format!("failed to send request: {e}")))?;

            let status = resp.status();
            let headers = resp
                .headers()
                .iter()
                .filter_map(|(name, value)| {
                    value
                        .to_str()
                        .ok()
                        .map(|v| (name.as_str().to_string(), v.to_string()))
                })
                .collect();

            let bytes = resp
                .into_body()
                .collect()
                .await
                .map_err(|e| Error::network(format!("failed to read response: {e}")))?
                .to_bytes();

            Ok(ResponseContext {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or("").to_string(),
                headers,
                data: decode_body(&bytes),
            })
        };

        let response = match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, exchange)
                .await
                .map_err(|_| Error::Timeout { timeout })??,
            None => exchange.await?,
        };

        if response.status >= 400 {
            return Err(Error::Http {
                status: response.status,
                status_text: response.status_text,
                body: Some(response.data),
            });
        }

        Ok(response)
    }
}

impl Transport for HyperTransport {
    fn name(&self) -> &str {
        "hyper"
    }

    fn execute<'a>(&'a self, request: RequestContext) -> BoxFuture<'a, Result<ResponseContext>> {
        Box::pin(self.perform(request))
    }
}

/// Check a base address and normalize it (trailing slash trimmed).
///
/// The address must parse as a URI with a scheme and host.
pub fn validate_base_url(base_url: &str) -> Result<String> {
    if base_url.is_empty() {
        return Err(Error::Config("base URL must not be empty".to_string()));
    }

    let uri: http::Uri = base_url
        .parse()
        .map_err(|e| Error::Config(format!("invalid base URL `{base_url}`: {e}")))?;
    if uri.scheme().is_none() || uri.authority().is_none() {
        return Err(Error::Config(format!(
            "base URL `{base_url}` must include scheme and host"
        )));
    }

    Ok(base_url.trim_end_matches('/').to_string())
}

fn join_url(base: &str, path: &str) -> String {
    if path.starts_with('/') {
        format!("{base}{path}")
    } else {
        format!("{base}/{path}")
    }
}

fn encode_body(request: &RequestContext) -> Result<Bytes> {
    match &request.body {
        Some(body) if request.method.requires_body() => serde_json::to_vec(body)
            .map(Bytes::from)
            .map_err(|e| Error::network(format!("failed to serialize body: {e}"))),
        _ => Ok(Bytes::new()),
    }
}

fn decode_body(bytes: &Bytes) -> Value {
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tether_core::Method;

    #[test]
    fn test_base_url_validation() {
        assert!(HyperTransport::new("http://localhost:8080").is_ok());
        assert!(HyperTransport::new("https://api.example.com/v1/").is_ok());

        let err = HyperTransport::new("").unwrap_err();
        assert_eq!(err.code(), "CONFIG_ERROR");

        let err = HyperTransport::new("not a url").unwrap_err();
        assert_eq!(err.code(), "CONFIG_ERROR");

        // Path-only target has no scheme or host
        let err = HyperTransport::new("/relative").unwrap_err();
        assert_eq!(err.code(), "CONFIG_ERROR");
    }

    #[test]
    fn test_debug_omits_client_internals() {
        let transport = HyperTransport::new("http://localhost:8080").unwrap();
        let rendered = format!("{transport:?}");
        assert!(rendered.contains("http://localhost:8080"));
        assert!(!rendered.contains("Client"));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = HyperTransportConfig::new("http://localhost:8080")
            .timeout(Duration::ZERO);
        let err = HyperTransport::with_config(config).unwrap_err();
        assert_eq!(err.code(), "CONFIG_ERROR");
    }

    #[test]
    fn test_join_url() {
        assert_eq!(
            join_url("http://localhost:8080", "/users"),
            "http://localhost:8080/users"
        );
        assert_eq!(
            join_url("http://localhost:8080", "users"),
            "http://localhost:8080/users"
        );
    }

    #[test]
    fn test_trailing_slash_trimmed_from_base() {
        assert_eq!(
            validate_base_url("http://localhost:8080/").unwrap(),
            "http://localhost:8080"
        );
    }

    #[test]
    fn test_encode_body_skips_get() {
        let mut request = RequestContext::new(Method::Get, "/users");
        request.body = Some(json!({"a": 1}));
        assert!(encode_body(&request).unwrap().is_empty());

        let request = RequestContext::new(Method::Post, "/users").with_body(json!({"a": 1}));
        assert_eq!(&encode_body(&request).unwrap()[..], br#"{"a":1}"#);
    }

    #[test]
    fn test_decode_body() {
        assert_eq!(decode_body(&Bytes::new()), Value::Null);
        assert_eq!(
            decode_body(&Bytes::from_static(br#"{"ok":true}"#)),
            json!({"ok": true})
        );
        assert_eq!(
            decode_body(&Bytes::from_static(b"plain text")),
            json!("plain text")
        );
    }
}
