//! Retry policies for idempotent reads.
//!
//! Mutations (create, retry submission) are never repeated automatically.

use std::future::Future;
use std::time::Duration;

use lens_logging::lens_debug;

use crate::ApiError;

pub trait RetryStrategy: Send + Sync {
    /// Delay before attempt `attempt + 1`, or `None` to give up.
    /// `attempt` counts finished attempts, starting at 1.
    fn next_delay(&self, attempt: u32, error: &ApiError) -> Option<Duration>;
}

/// Fail on the first error.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRetry;

impl RetryStrategy for NoRetry {
    fn next_delay(&self, _attempt: u32, _error: &ApiError) -> Option<Duration> {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExponentialBackoff {
    /// Total attempts including the first.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
        }
    }
}

impl RetryStrategy for ExponentialBackoff {
    fn next_delay(&self, attempt: u32, error: &ApiError) -> Option<Duration> {
        if attempt >= self.max_attempts || !error.is_transient() {
            return None;
        }
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        Some(self.base_delay.saturating_mul(factor).min(self.max_delay))
    }
}

/// Run `operation` until it succeeds or `strategy` gives up.
pub async fn with_retry<T, F, Fut>(strategy: &dyn RetryStrategy, mut operation: F) -> Result<T, ApiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    let mut attempt = 0;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                attempt += 1;
                match strategy.next_delay(attempt, &err) {
                    Some(delay) => {
                        lens_debug!("attempt {attempt} failed ({err}), retrying in {delay:?}");
                        tokio::time::sleep(delay).await;
                    }
                    None => return Err(err),
                }
            }
        }
    }
}
