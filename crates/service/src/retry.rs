use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

use common::observability::RETRIES_TOTAL;
use crate::errors::ServiceError;

/// Errors that know whether another attempt could succeed.
pub trait Retryable: std::fmt::Display {
    fn is_retryable(&self) -> bool;
}

impl Retryable for ServiceError {
    fn is_retryable(&self) -> bool { ServiceError::is_retryable(self) }
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff_base: Duration,
    backoff_max: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff_base: Duration, backoff_max: Duration) -> Self {
        Self { max_attempts: max_attempts.max(1), backoff_base, backoff_max }
    }

    pub fn from_config(p: &configs::PolicyConfig) -> Self {
        Self::new(
            p.retry_max_attempts,
            Duration::from_millis(p.retry_backoff_base_ms),
            Duration::from_millis(p.retry_backoff_max_ms),
        )
    }

    /// One attempt, no waiting.
    pub fn none() -> Self { Self::new(1, Duration::ZERO, Duration::ZERO) }

    pub fn max_attempts(&self) -> u32 { self.max_attempts }

    /// Exponential backoff for the given retry (1-based), capped at `backoff_max`.
    pub fn backoff(&self, retry: u32) -> Duration {
        if retry == 0 {
            return Duration::ZERO;
        }
        let factor = 2_u32.saturating_pow(retry - 1);
        self.backoff_base.saturating_mul(factor).min(self.backoff_max)
    }

    pub async fn wait_before_retry(&self, retry: u32) {
        let d = self.backoff(retry);
        debug!("Retrying in {:?} (attempt {})", d, retry + 1);
        sleep(d).await;
    }
}

impl Default for RetryPolicy {
    fn default() -> Self { Self::from_config(&configs::PolicyConfig::default()) }
}

/// Run `operation` until it succeeds, fails with a non-retryable error, or the
/// attempt budget is spent. The last error is returned as-is.
pub async fn retry_with_policy<F, Fut, T, E>(policy: &RetryPolicy, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: Retryable,
{
    let mut attempt = 0;
    loop {
        if attempt > 0 {
            RETRIES_TOTAL.inc();
            policy.wait_before_retry(attempt).await;
        }
        match operation().await {
            Ok(v) => {
                if attempt > 0 {
                    debug!("Operation succeeded after {} retries", attempt);
                }
                return Ok(v);
            }
            Err(e) => {
                attempt += 1;
                if !e.is_retryable() || attempt >= policy.max_attempts() {
                    if e.is_retryable() {
                        warn!(attempts = attempt, error = %e, "giving up after retries");
                    }
                    return Err(e);
                }
                warn!("Operation failed on attempt {}: {}", attempt, e);
            }
        }
    }
}
