//! Request executor: retry with exponential backoff
//!
//! Every outbound call in the engine goes through `RequestExecutor::execute`.
//! Delay before retry `n` is `initial_delay_ms * 2^(n-1)`; no jitter, no cap.

use std::future::Future;
use std::time::Duration;
use tracing::debug;

use crate::models::config::ScanConfig;
use crate::models::errors::AppResult;

/// Retry budget for a single remote call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_retries: u32,
    /// Delay before the first retry
    pub initial_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 1000,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, initial_delay_ms: u64) -> Self {
        Self {
            max_retries: max_retries.max(1),
            initial_delay_ms,
        }
    }

    /// Delay before retry `n` (1-based)
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 2u64.saturating_pow(retry.saturating_sub(1));
        Duration::from_millis(self.initial_delay_ms.saturating_mul(factor))
    }
}

/// Retrying wrapper around fallible async calls
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestExecutor {
    policy: RetryPolicy,
}

impl RequestExecutor {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub fn from_config(config: &ScanConfig) -> Self {
        Self::new(RetryPolicy::new(config.max_retries, config.initial_backoff_ms))
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Run `op` until it succeeds, fails permanently, or the budget runs out.
    ///
    /// Non-retryable errors (reverts, oversized queries) return right away.
    /// Otherwise the error of the last attempt is returned unchanged.
    pub async fn execute<T, F, Fut>(&self, label: &str, mut op: F) -> AppResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        let max_attempts = self.policy.max_retries.max(1);
        let mut attempt = 1;

        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if !e.is_retryable() || attempt >= max_attempts => return Err(e),
                Err(e) => {
                    let delay = self.policy.delay_for(attempt);
                    debug!(
                        "⏳ {} failed ({}), retry {}/{} in {}ms",
                        label,
                        e,
                        attempt,
                        max_attempts - 1,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
