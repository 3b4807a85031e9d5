//! Cache middleware with a pluggable storage backend.

use crate::middleware::{Middleware, Next};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tether_core::{RequestContext, ResponseContext, Result};
use tether_transport::BoxFuture;
use tracing::debug;

/// One cached exchange.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub data: ResponseContext,
    pub timestamp: Instant,
    pub ttl: Duration,
}

impl CacheEntry {
    /// Whether the entry's ttl has elapsed.
    pub fn is_expired(&self) -> bool {
        self.timestamp.elapsed() > self.ttl
    }
}

/// Storage backend for the cache middleware.
///
/// Implementations must be safe under concurrent access; last-writer-wins
/// on a racing set is acceptable.
pub trait CacheStore: Send + Sync {
    /// Fetch a fresh entry; expired entries are treated as absent.
    fn get(&self, key: &str) -> Option<CacheEntry>;
    fn set(&self, key: String, entry: CacheEntry);
    fn delete(&self, key: &str);
    fn clear(&self);
}

/// In-memory store with lazy expiry: a stale entry found on read is
/// evicted there and then, never swept proactively.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entries (expired ones still count until read).
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CacheStore for MemoryStore {
    fn get(&self, key: &str) -> Option<CacheEntry> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        match entries.get(key) {
            Some(entry) if entry.is_expired() => {
                entries.remove(key);
                None
            }
            Some(entry) => Some(entry.clone()),
            None => None,
        }
    }

    fn set(&self, key: String, entry: CacheEntry) {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key, entry);
    }

    fn delete(&self, key: &str) {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(key);
    }

    fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }
}

type KeyFn = Arc<dyn Fn(&RequestContext) -> String + Send + Sync>;
type CacheablePredicate = Arc<dyn Fn(&RequestContext, &ResponseContext) -> bool + Send + Sync>;

/// Middleware that serves repeated requests from a cache.
///
/// On a hit the rest of the chain never runs; on a miss the response is
/// stored when the cacheability predicate accepts it (by default: GET
/// requests with a 2xx response).
pub struct CacheMiddleware {
    ttl: Duration,
    key_fn: KeyFn,
    cacheable: CacheablePredicate,
    store: Arc<dyn CacheStore>,
}

impl CacheMiddleware {
    /// Cache with the given ttl, default key function, default
    /// cacheability predicate and an in-memory store.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            key_fn: Arc::new(default_cache_key),
            cacheable: Arc::new(default_cacheable),
            store: Arc::new(MemoryStore::new()),
        }
    }

    /// Override the cache-key function.
    pub fn key_fn(mut self, f: impl Fn(&RequestContext) -> String + Send + Sync + 'static) -> Self {
        self.key_fn = Arc::new(f);
        self
    }

    /// Override the cacheability predicate.
    pub fn cacheable(
        mut self,
        f: impl Fn(&RequestContext, &ResponseContext) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.cacheable = Arc::new(f);
        self
    }

    /// Use a custom storage backend.
    pub fn store(mut self, store: Arc<dyn CacheStore>) -> Self {
        self.store = store;
        self
    }
}

/// Default cache key: method, URL, query JSON and body JSON.
pub fn default_cache_key(request: &RequestContext) -> String {
    let query = Value::Object(request.query.clone());
    let body = request.body.clone().unwrap_or(Value::Null);
    format!("{} {} {} {}", request.method, request.url, query, body)
}

/// Default cacheability: GET requests with a 2xx response.
pub fn default_cacheable(request: &RequestContext, response: &ResponseContext) -> bool {
    request.method == tether_core::Method::Get && response.is_success()
}

impl Middleware for CacheMiddleware {
    fn handle<'a>(
        &'a self,
        request: RequestContext,
        next: Next,
    ) -> BoxFuture<'a, Result<ResponseContext>> {
        Box::pin(async move {
            let key = (self.key_fn)(&request);

            if let Some(entry) = self.store.get(&key) {
                debug!(%key, "cache hit");
                return Ok(entry.data);
            }

            let response = next.run(request.clone()).await?;

            if (self.cacheable)(&request, &response) {
                self.store.set(
                    key,
                    CacheEntry {
                        data: response.clone(),
                        timestamp: Instant::now(),
                        ttl: self.ttl,
                    },
                );
            }

            Ok(response)
        })
    }
}
