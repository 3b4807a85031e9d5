//! Transport layer for the Tether contract-first HTTP client.
//!
//! The [`Transport`] trait is the boundary where third-party networking
//! semantics are translated into Tether's normalized model: an adapter
//! accepts a [`RequestContext`], returns a [`ResponseContext`], and may
//! raise only taxonomized errors.

pub mod hyper;

pub use hyper::{validate_base_url, HyperTransport, HyperTransportConfig};

use std::future::Future;
use std::pin::Pin;
use tether_core::{RequestContext, ResponseContext, Result};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// An HTTP exchange primitive.
///
/// Implementations must catch every underlying-library failure and
/// re-wrap it: the only errors allowed across this boundary are
/// `Http` (non-2xx status), `Network` and `Timeout`.
pub trait Transport: Send + Sync {
    /// Stable adapter name for diagnostics.
    fn name(&self) -> &str;

    /// Perform one request/response exchange.
    fn execute<'a>(&'a self, request: RequestContext) -> BoxFuture<'a, Result<ResponseContext>>;
}
