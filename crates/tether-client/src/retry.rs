//! Retry middleware with configurable backoff.

use crate::middleware::{Middleware, Next};
use std::sync::Arc;
use std::time::Duration;
use tether_core::{Error, RequestContext, ResponseContext, Result};
use tether_transport::BoxFuture;
use tracing::debug;

/// Backoff strategy between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// `delay * (n + 1)` for retry number `n`.
    Linear,
    /// `delay * 2^n` for retry number `n`.
    Exponential,
}

type RetryPredicate = Arc<dyn Fn(&Error) -> bool + Send + Sync>;
type RetryObserver = Arc<dyn Fn(u32, &Error) + Send + Sync>;

/// Middleware that re-invokes the rest of the chain on retryable errors.
///
/// On exhausting its attempts it re-raises the last error unchanged.
pub struct RetryMiddleware {
    retries: u32,
    delay: Duration,
    backoff: Backoff,
    jitter: f64,
    retry_if: Option<RetryPredicate>,
    on_retry: Option<RetryObserver>,
}

impl RetryMiddleware {
    /// Retry up to `retries` additional attempts with defaults:
    /// 100ms base delay, exponential backoff, no jitter.
    pub fn new(retries: u32) -> Self {
        Self {
            retries,
            delay: Duration::from_millis(100),
            backoff: Backoff::Exponential,
            jitter: 0.0,
            retry_if: None,
            on_retry: None,
        }
    }

    /// Set the base delay.
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Set the backoff strategy.
    pub fn backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Set a jitter factor (0.0 to 1.0) applied to each computed delay.
    pub fn jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter.clamp(0.0, 1.0);
        self
    }

    /// Override the retryable-error predicate.
    pub fn retry_if(mut self, predicate: impl Fn(&Error) -> bool + Send + Sync + 'static) -> Self {
        self.retry_if = Some(Arc::new(predicate));
        self
    }

    /// Observe each retry: called with `(retry number, error)` before the
    /// backoff sleep.
    pub fn on_retry(mut self, observer: impl Fn(u32, &Error) + Send + Sync + 'static) -> Self {
        self.on_retry = Some(Arc::new(observer));
        self
    }

    fn is_retryable(&self, error: &Error) -> bool {
        match &self.retry_if {
            Some(predicate) => predicate(error),
            None => default_retryable(error),
        }
    }

    fn backoff_delay(&self, retry: u32) -> Duration {
        let base = self.delay.as_millis() as f64;
        let scaled = match self.backoff {
            Backoff::Linear => base * (retry as f64 + 1.0),
            Backoff::Exponential => base * 2f64.powi(retry as i32),
        };

        let jittered = if self.jitter > 0.0 {
            scaled * (1.0 + (rand::random::<f64>() * self.jitter * 2.0 - self.jitter))
        } else {
            scaled
        };

        Duration::from_millis(jittered.max(0.0) as u64)
    }
}

/// Default retryability: network and timeout failures, and HTTP errors
/// with status >= 500, 408 or 429. Validation and config errors never
/// retry.
pub fn default_retryable(error: &Error) -> bool {
    match error {
        Error::Network { .. } | Error::Timeout { .. } => true,
        Error::Http { status, .. } => *status >= 500 || *status == 408 || *status == 429,
        _ => false,
    }
}

impl Middleware for RetryMiddleware {
    fn handle<'a>(
        &'a self,
        request: RequestContext,
        next: Next,
    ) -> BoxFuture<'a, Result<ResponseContext>> {
        Box::pin(async move {
            let mut retry = 0u32;
            loop {
                match next.clone().run(request.clone()).await {
                    Ok(response) => return Ok(response),
                    Err(error) => {
                        if retry >= self.retries || !self.is_retryable(&error) {
                            return Err(error);
                        }
                        if let Some(observer) = &self.on_retry {
                            observer(retry + 1, &error);
                        }
                        debug!(retry = retry + 1, error = %error, "retrying request");
                        tokio::time::sleep(self.backoff_delay(retry)).await;
                        retry += 1;
                    }
                }
            }
        })
    }
}
