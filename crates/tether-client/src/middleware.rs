//! Middleware chain: ordered, composable wrappers around the transport.
//!
//! A middleware receives the request and a [`Next`] continuation
//! representing the rest of the chain, terminating at the transport. Each
//! middleware fully wraps everything after it (onion model): it can run
//! code before and after the inner call, transform the response,
//! short-circuit by not calling `next`, or call `next` multiple times to
//! retry.

use std::sync::Arc;
use tether_core::{RequestContext, ResponseContext, Result};
use tether_transport::{BoxFuture, Transport};

/// A composable wrapper around the transport call.
pub trait Middleware: Send + Sync {
    fn handle<'a>(
        &'a self,
        request: RequestContext,
        next: Next,
    ) -> BoxFuture<'a, Result<ResponseContext>>;
}

/// Continuation into the remainder of the chain.
///
/// Cloneable so a middleware can invoke the tail more than once (retry)
/// or not at all (cache hit, short-circuit).
#[derive(Clone)]
pub struct Next {
    chain: Arc<[Arc<dyn Middleware>]>,
    index: usize,
    transport: Arc<dyn Transport>,
}

impl Next {
    /// Entry point: a continuation over the full chain.
    pub fn new(chain: Arc<[Arc<dyn Middleware>]>, transport: Arc<dyn Transport>) -> Self {
        Self {
            chain,
            index: 0,
            transport,
        }
    }

    /// Continue to the rest of the chain with the given request.
    pub fn run(self, request: RequestContext) -> BoxFuture<'static, Result<ResponseContext>> {
        let Next {
            chain,
            index,
            transport,
        } = self;

        if index < chain.len() {
            let middleware = chain[index].clone();
            let next = Next {
                chain,
                index: index + 1,
                transport,
            };
            Box::pin(async move { middleware.handle(request, next).await })
        } else {
            Box::pin(async move { transport.execute(request).await })
        }
    }
}

/// Middleware backed by a plain closure.
///
/// Any function matching `(request, next) -> future of response` is a
/// valid middleware.
pub struct FnMiddleware<F> {
    f: F,
}

impl<F> FnMiddleware<F>
where
    F: Fn(RequestContext, Next) -> BoxFuture<'static, Result<ResponseContext>> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> Middleware for FnMiddleware<F>
where
    F: Fn(RequestContext, Next) -> BoxFuture<'static, Result<ResponseContext>> + Send + Sync,
{
    fn handle<'a>(
        &'a self,
        request: RequestContext,
        next: Next,
    ) -> BoxFuture<'a, Result<ResponseContext>> {
        (self.f)(request, next)
    }
}

/// Compose an ordered list of middleware into a single middleware.
///
/// Ordering is preserved recursively: the first element of `inner` wraps
/// everything after it, and the composed middleware's own `next` becomes
/// the innermost continuation.
pub fn compose(inner: Vec<Arc<dyn Middleware>>) -> Arc<dyn Middleware> {
    Arc::new(Composed {
        inner: inner.into(),
    })
}

struct Composed {
    inner: Arc<[Arc<dyn Middleware>]>,
}

impl Middleware for Composed {
    fn handle<'a>(
        &'a self,
        request: RequestContext,
        next: Next,
    ) -> BoxFuture<'a, Result<ResponseContext>> {
        let sub = Next::new(self.inner.clone(), Arc::new(Tail(next)));
        sub.run(request)
    }
}

/// Adapter that lets an outer continuation terminate an inner chain.
struct Tail(Next);

impl Transport for Tail {
    fn name(&self) -> &str {
        "chain"
    }

    fn execute<'a>(&'a self, request: RequestContext) -> BoxFuture<'a, Result<ResponseContext>> {
        self.0.clone().run(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use std::sync::Mutex;
    use tether_core::Method;

    struct EchoTransport;

    impl Transport for EchoTransport {
        fn name(&self) -> &str {
            "echo"
        }

        fn execute<'a>(
            &'a self,
            request: RequestContext,
        ) -> BoxFuture<'a, Result<ResponseContext>> {
            Box::pin(async move {
                Ok(ResponseContext::new(
                    200,
                    "OK",
                    Value::String(request.url),
                ))
            })
        }
    }

    struct Tagging {
        name: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl Middleware for Tagging {
        fn handle<'a>(
            &'a self,
            request: RequestContext,
            next: Next,
        ) -> BoxFuture<'a, Result<ResponseContext>> {
            Box::pin(async move {
                self.log.lock().unwrap().push(format!("{}:before", self.name));
                let response = next.run(request).await;
                self.log.lock().unwrap().push(format!("{}:after", self.name));
                response
            })
        }
    }

    #[tokio::test]
    async fn test_empty_chain_reaches_transport() {
        let chain: Arc<[Arc<dyn Middleware>]> = Vec::new().into();
        let next = Next::new(chain, Arc::new(EchoTransport));
        let response = next.run(RequestContext::new(Method::Get, "/ping")).await.unwrap();
        assert_eq!(response.data, Value::String("/ping".to_string()));
    }

    #[tokio::test]
    async fn test_onion_ordering() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let chain: Arc<[Arc<dyn Middleware>]> = vec![
            Arc::new(Tagging {
                name: "x",
                log: log.clone(),
            }) as Arc<dyn Middleware>,
            Arc::new(Tagging {
                name: "y",
                log: log.clone(),
            }),
        ]
        .into();

        let next = Next::new(chain, Arc::new(EchoTransport));
        next.run(RequestContext::new(Method::Get, "/ping")).await.unwrap();

        let entries = log.lock().unwrap().clone();
        assert_eq!(entries, vec!["x:before", "y:before", "y:after", "x:after"]);
    }

    #[tokio::test]
    async fn test_short_circuit_skips_transport() {
        let shortcut = FnMiddleware::new(|_request, _next| {
            Box::pin(async {
                Ok(ResponseContext::new(200, "OK", Value::String("cached".to_string())))
            }) as BoxFuture<'static, Result<ResponseContext>>
        });

        let chain: Arc<[Arc<dyn Middleware>]> =
            vec![Arc::new(shortcut) as Arc<dyn Middleware>].into();
        let next = Next::new(chain, Arc::new(EchoTransport));
        let response = next.run(RequestContext::new(Method::Get, "/ping")).await.unwrap();
        assert_eq!(response.data, Value::String("cached".to_string()));
    }

    #[tokio::test]
    async fn test_compose_preserves_ordering() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let composed = compose(vec![
            Arc::new(Tagging {
                name: "a",
                log: log.clone(),
            }) as Arc<dyn Middleware>,
            Arc::new(Tagging {
                name: "b",
                log: log.clone(),
            }),
        ]);

        let chain: Arc<[Arc<dyn Middleware>]> = vec![
            Arc::new(Tagging {
                name: "outer",
                log: log.clone(),
            }) as Arc<dyn Middleware>,
            composed,
        ]
        .into();

        let next = Next::new(chain, Arc::new(EchoTransport));
        next.run(RequestContext::new(Method::Get, "/ping")).await.unwrap();

        let entries = log.lock().unwrap().clone();
        assert_eq!(
            entries,
            vec![
                "outer:before",
                "a:before",
                "b:before",
                "b:after",
                "a:after",
                "outer:after"
            ]
        );
    }
}
