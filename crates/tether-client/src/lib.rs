//! Client core for the Tether contract-first HTTP client.
//!
//! This crate provides the client-side components:
//! - Client construction from a contract and configuration
//! - The middleware chain (onion model) with retry and cache built-ins
//! - Per-endpoint invocation and schema introspection

pub mod cache;
pub mod client;
pub mod config;
pub mod middleware;
pub mod retry;

pub use cache::{CacheEntry, CacheMiddleware, CacheStore, MemoryStore};
pub use client::{Client, EndpointHandle, Scope};
pub use config::{ClientConfig, Target};
pub use middleware::{compose, FnMiddleware, Middleware, Next};
pub use retry::{default_retryable, Backoff, RetryMiddleware};

// Re-exported so downstream crates need only this one
pub use tether_core::{
    Contract, ContractNode, Endpoint, EndpointDescription, Error, Issue, Method, RequestContext,
    ResponseContext, Result, Schema, SchemaShape, ValidationKind, Validator,
};
pub use tether_transport::{BoxFuture, HyperTransport, HyperTransportConfig, Transport};

/// Create a client from a contract and configuration.
///
/// Convenience alias for [`Client::new`].
pub fn create_client(contract: Contract, config: ClientConfig) -> Result<Client> {
    Client::new(contract, config)
}
