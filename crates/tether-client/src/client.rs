//! Client core: the orchestrator binding a contract to a transport.

use crate::config::{ClientConfig, Target};
use crate::middleware::{Middleware, Next};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tether_core::path::{build_query_string, build_url, split_params, substitute};
use tether_core::{
    validate_with, Contract, Endpoint, EndpointDescription, Error, Method, RequestContext, Result,
    ValidationKind, Validator,
};
use tether_transport::{HyperTransport, HyperTransportConfig, Transport};
use tracing::instrument;

/// Contract-bound HTTP client.
///
/// Construction flattens the contract into a registry of dotted endpoint
/// keys. The client is stateless across calls apart from the lazily
/// initialized transport handle and whatever state individual middleware
/// instances hold; independent invocations may run concurrently.
pub struct Client {
    contract: Contract,
    registry: HashMap<String, Endpoint>,
    validate_request: bool,
    validate_response: bool,
    default_headers: HashMap<String, String>,
    middleware: Vec<Arc<dyn Middleware>>,
    target: Target,
    timeout: Option<Duration>,
    transport: OnceLock<Arc<dyn Transport>>,
}

impl Client {
    /// Create a client from a contract and configuration.
    ///
    /// Configuration is validated here; the transport itself is not built
    /// until the first call needs it.
    pub fn new(contract: Contract, config: ClientConfig) -> Result<Self> {
        let internal = config.into_internal()?;
        let registry = contract.flatten().into_iter().collect();

        Ok(Self {
            contract,
            registry,
            validate_request: internal.validate_request,
            validate_response: internal.validate_response,
            default_headers: internal.default_headers,
            middleware: internal.middleware,
            target: internal.target,
            timeout: internal.timeout,
            transport: OnceLock::new(),
        })
    }

    /// The contract this client was built from.
    pub fn contract(&self) -> &Contract {
        &self.contract
    }

    /// Top-level endpoint keys (nested-group keys excluded).
    pub fn endpoint_keys(&self) -> Vec<&str> {
        self.contract.endpoint_keys()
    }

    /// Request/response validators for the endpoint at a dotted key.
    #[allow(clippy::type_complexity)]
    pub fn schema(
        &self,
        key: &str,
    ) -> Result<(Option<Arc<dyn Validator>>, Option<Arc<dyn Validator>>)> {
        self.contract.schema(key)
    }

    /// Documentation-oriented description of the endpoint at a dotted key.
    pub fn describe(&self, key: &str) -> Result<EndpointDescription> {
        self.contract.describe(key)
    }

    /// Bound handle for the endpoint at a dotted key.
    pub fn endpoint(&self, key: &str) -> Result<EndpointHandle<'_>> {
        match self.registry.get(key) {
            Some(endpoint) => Ok(EndpointHandle {
                client: self,
                key: key.to_string(),
                endpoint,
            }),
            // Resolve through the contract for the precise failure
            None => match self.contract.resolve(key) {
                Err(e) => Err(e),
                Ok(_) => Err(Error::Config(format!("unknown endpoint key `{key}`"))),
            },
        }
    }

    /// Scoped accessor over a nested group.
    pub fn at(&self, key: &str) -> Result<Scope<'_>> {
        self.contract.resolve_group(key)?;
        Ok(Scope {
            client: self,
            prefix: key.to_string(),
        })
    }

    /// Invoke the endpoint at a dotted key.
    ///
    /// Endpoints without a request validator ignore `data`.
    pub async fn call(&self, key: &str, data: Option<Value>) -> Result<Value> {
        let handle = self.endpoint(key)?;
        self.dispatch(key, handle.endpoint, data).await
    }

    /// Append a middleware after any supplied at construction time.
    ///
    /// Appended middleware runs innermost, closest to the transport.
    pub fn push_middleware<M: Middleware + 'static>(&mut self, middleware: M) {
        self.middleware.push(Arc::new(middleware));
    }

    /// Lazily build and memoize the transport handle.
    fn transport(&self) -> Result<Arc<dyn Transport>> {
        if let Some(transport) = self.transport.get() {
            return Ok(transport.clone());
        }

        let built: Arc<dyn Transport> = match &self.target {
            Target::Transport(transport) => transport.clone(),
            Target::BaseUrl(url) => {
                let mut config = HyperTransportConfig::new(url.clone());
                if let Some(timeout) = self.timeout {
                    config = config.timeout(timeout);
                }
                Arc::new(HyperTransport::with_config(config)?)
            }
        };

        Ok(self.transport.get_or_init(|| built).clone())
    }

    #[instrument(skip(self, endpoint, data))]
    async fn dispatch(&self, key: &str, endpoint: &Endpoint, data: Option<Value>) -> Result<Value> {
        // Endpoints without a request validator take no meaningful input.
        let input = if endpoint.request.is_some() {
            data
        } else {
            None
        };

        // Request validation happens caller-side; a failure never reaches
        // the transport.
        let validated = match (&endpoint.request, self.validate_request) {
            (Some(validator), true) => Some(validate_with(
                Some(validator.as_ref()),
                ValidationKind::Request,
                input.unwrap_or(Value::Null),
            )?),
            _ => input,
        };

        let (params, remainder) = split_params(&endpoint.path, validated.as_ref());
        let resolved = substitute(&endpoint.path, &params);

        let mut request = RequestContext::new(endpoint.method, String::new());
        request.params = params;
        request.headers = self.default_headers.clone();

        if endpoint.method == Method::Get {
            let query_string = build_query_string(&remainder);
            request.url = build_url(&resolved, &query_string);
            request.query = remainder;
        } else {
            request.url = build_url(&resolved, "");
            if endpoint.method.requires_body() {
                // The entire validated input is the body; path-matched
                // fields are not stripped.
                request.body = validated;
            }
        }

        let chain: Arc<[Arc<dyn Middleware>]> = self.middleware.clone().into();
        let transport = self.transport()?;
        let response = Next::new(chain, transport).run(request).await?;

        // Only the body is surfaced; status and headers stay inside the
        // pipeline.
        if self.validate_response {
            validate_with(
                endpoint.response.as_deref(),
                ValidationKind::Response,
                response.data,
            )
        } else {
            Ok(response.data)
        }
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("endpoints", &self.registry.len())
            .field("target", &self.target)
            .field("validate_request", &self.validate_request)
            .field("validate_response", &self.validate_response)
            .field("middleware", &self.middleware.len())
            .finish()
    }
}

/// A bound, schema-aware handle to one endpoint.
pub struct EndpointHandle<'a> {
    client: &'a Client,
    key: String,
    endpoint: &'a Endpoint,
}

impl EndpointHandle<'_> {
    /// The dotted key this handle was resolved from.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The raw endpoint definition.
    pub fn definition(&self) -> &Endpoint {
        self.endpoint
    }

    /// The endpoint's request validator, when declared.
    pub fn request_schema(&self) -> Option<&Arc<dyn Validator>> {
        self.endpoint.request.as_ref()
    }

    /// The endpoint's response validator, when declared.
    pub fn response_schema(&self) -> Option<&Arc<dyn Validator>> {
        self.endpoint.response.as_ref()
    }

    /// Documentation-oriented description of this endpoint.
    pub fn describe(&self) -> EndpointDescription {
        self.endpoint.describe(&self.key)
    }

    /// Invoke this endpoint.
    pub async fn call(&self, data: Option<Value>) -> Result<Value> {
        self.client.dispatch(&self.key, self.endpoint, data).await
    }
}

impl std::fmt::Debug for EndpointHandle<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EndpointHandle")
            .field("key", &self.key)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

/// Accessor over a nested contract group, resolving keys relative to its
/// prefix. Supports arbitrary nesting depth.
pub struct Scope<'a> {
    client: &'a Client,
    prefix: String,
}

impl Scope<'_> {
    /// The dotted prefix this scope is rooted at.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Invoke an endpoint relative to this scope.
    pub async fn call(&self, key: &str, data: Option<Value>) -> Result<Value> {
        self.client.call(&self.full(key), data).await
    }

    /// Bound handle for an endpoint relative to this scope.
    pub fn endpoint(&self, key: &str) -> Result<EndpointHandle<'_>> {
        self.client.endpoint(&self.full(key))
    }

    /// Descend into a nested group.
    pub fn at(&self, key: &str) -> Result<Scope<'_>> {
        self.client.at(&self.full(key))
    }

    fn full(&self, key: &str) -> String {
        format!("{}.{}", self.prefix, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tether_core::Schema;

    fn contract() -> Contract {
        Contract::new()
            .endpoint("ping", Endpoint::get("/ping"))
            .group(
                "users",
                Contract::new().endpoint(
                    "get",
                    Endpoint::get("/users/:id")
                        .request(Schema::object(vec![("id", Schema::String)])),
                ),
            )
    }

    #[test]
    fn test_construction_validates_config() {
        let err = Client::new(contract(), ClientConfig::new()).unwrap_err();
        assert_eq!(err.code(), "CONFIG_ERROR");

        let client = Client::new(
            contract(),
            ClientConfig::new().base_url("http://localhost:8080"),
        )
        .unwrap();
        assert_eq!(client.endpoint_keys(), vec!["ping"]);
    }

    #[test]
    fn test_endpoint_lookup() {
        let client = Client::new(
            contract(),
            ClientConfig::new().base_url("http://localhost:8080"),
        )
        .unwrap();

        let handle = client.endpoint("users.get").unwrap();
        assert_eq!(handle.key(), "users.get");
        assert!(handle.request_schema().is_some());
        assert!(handle.response_schema().is_none());
        assert_eq!(handle.describe().request, "{ id: string }");

        let rendered = format!("{:?}", handle);
        assert!(rendered.contains("users.get"));

        let err = client.endpoint("users.missing").unwrap_err();
        assert_eq!(err.code(), "CONFIG_ERROR");

        let err = client.endpoint("users").unwrap_err();
        assert_eq!(err.code(), "CONFIG_ERROR");
    }

    #[test]
    fn test_scope_rejects_endpoint_keys() {
        let client = Client::new(
            contract(),
            ClientConfig::new().base_url("http://localhost:8080"),
        )
        .unwrap();

        assert!(client.at("users").is_ok());
        assert!(client.at("ping").is_err());
        assert!(client.at("missing").is_err());
    }
}
