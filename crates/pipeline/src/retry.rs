//! Retry policy for ledger fetches
//!
//! A failed fetch is repeated with the same arguments up to `max_retries`
//! more times. Exhaustion surfaces the last error unchanged.

use std::future::Future;
use std::time::Duration;

use conduit_config::OracleConfig;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{PipelineError, Result};

/// Retry bound and backoff curve
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts after the first one
    pub max_retries: u32,
    /// Base delay, doubled on every retry (zero = retry immediately)
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::immediate(conduit_config::DEFAULT_NUM_OF_RETRIES)
    }
}

impl RetryPolicy {
    /// Retry without waiting between attempts
    pub const fn immediate(max_retries: u32) -> Self {
        Self {
            max_retries,
            base_delay: Duration::ZERO,
        }
    }

    /// Total attempts, including the first
    #[inline]
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay before retry number `attempt` (0-based), capped at 64x
    ///
    /// Saturates at `Duration::MAX` for absurd base delays.
    pub fn delay(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(1u32 << attempt.min(6))
    }
}

impl From<&OracleConfig> for RetryPolicy {
    fn from(cfg: &OracleConfig) -> Self {
        Self {
            max_retries: cfg.num_of_retries,
            base_delay: cfg.retry_delay,
        }
    }
}

/// Run `operation` until it succeeds or the policy is exhausted
///
/// Backoff waits race the cancellation token.
///
/// # Errors
///
/// The error of the last attempt, or `ShuttingDown` if cancelled while
/// waiting between attempts.
pub async fn execute_with_retry<F, Fut, T, E>(
    policy: &RetryPolicy,
    cancel: &CancellationToken,
    operation_name: &str,
    mut operation: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<T, E>>,
    E: Into<PipelineError> + std::fmt::Display,
{
    let mut attempt = 0;

    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };

        if attempt >= policy.max_retries {
            debug!(
                operation = operation_name,
                attempts = policy.max_attempts(),
                error = %err,
                "retries exhausted"
            );
            return Err(err.into());
        }

        let delay = policy.delay(attempt);
        debug!(
            operation = operation_name,
            attempt,
            delay = ?delay,
            error = %err,
            "request failed, will retry"
        );

        if !delay.is_zero() {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(PipelineError::ShuttingDown),
                _ = tokio::time::sleep(delay) => {}
            }
        }

        attempt += 1;
    }
}
