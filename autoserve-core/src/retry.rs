//! Bounded retry with exponential backoff for registrar calls.

use std::future::Future;
use std::time::Duration;

use crate::error::{CoreError, CoreResult};

/// Retry policy for transient registrar failures
///
/// Only [`CoreError::is_retryable`] errors are retried. A `Retry-After` hint
/// from the registrar replaces the computed backoff, capped at
/// `max_retry_after`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub max_retry_after: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(10),
            max_retry_after: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Never retry.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            max_retry_after: Duration::ZERO,
        }
    }

    /// Exponential backoff: base, 2×base, 4×base, ... capped at `max_delay`
    #[must_use]
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let capped_attempt = attempt.min(20); // Prevent 2^attempt from overflowing
        self.base_delay
            .saturating_mul(1_u32 << capped_attempt)
            .min(self.max_delay)
    }

    /// Delay before the next attempt after `error` on zero-based `attempt`.
    #[must_use]
    pub fn retry_delay(&self, error: &CoreError, attempt: u32) -> Duration {
        match error.retry_after() {
            Some(secs) => Duration::from_secs(secs).min(self.max_retry_after),
            None => self.backoff_delay(attempt),
        }
    }

    /// Runs `op` until it succeeds, fails with a non-retryable error, or the
    /// attempt budget is spent. The last error is returned unchanged.
    pub async fn run<T, F, Fut>(&self, operation: &str, mut op: F) -> CoreResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = CoreResult<T>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt + 1 < max_attempts => {
                    let delay = self.retry_delay(&e, attempt);
                    log::warn!(
                        "{operation} failed (attempt {}/{max_attempts}), retrying in {:.1}s: {e}",
                        attempt + 1,
                        delay.as_secs_f32(),
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
