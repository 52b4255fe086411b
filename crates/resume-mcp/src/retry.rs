//! Retry utilities with exponential backoff.
//!
//! Only the section reader retries; every other tool fails on the first
//! error so that a half-applied mutation is never replayed.
//!
//! # Example
//!
//! ```rust,no_run
//! use resume_mcp::retry::{with_retry_if, RetryConfig};
//!
//! #[derive(Debug)]
//! enum FetchError {
//!     Timeout,
//!     NotFound,
//! }
//!
//! impl std::fmt::Display for FetchError {
//!     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
//!         write!(f, "{:?}", self)
//!     }
//! }
//!
//! async fn example() -> Result<(), FetchError> {
//!     with_retry_if(
//!         &RetryConfig::reads(3),
//!         || async { Err(FetchError::Timeout) },
//!         |err| matches!(err, FetchError::Timeout),
//!     )
//!     .await
//! }
//! ```

use std::time::Duration;
use tokio::time::sleep;

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first
    pub max_attempts: u32,

    /// Delay before the first retry
    pub initial_delay: Duration,

    /// Maximum delay between retries
    pub max_delay: Duration,

    /// Base for exponential backoff
    pub exponential_base: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::reads(3)
    }
}

impl RetryConfig {
    /// Backoff used for retried reads: 500ms, 1s, 2s, ... capped at 8s.
    pub fn reads(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
            exponential_base: 2.0,
        }
    }

    /// Delay before the retry that follows `attempt` (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = self.exponential_base.powi(attempt.saturating_sub(1) as i32);
        let secs = (self.initial_delay.as_secs_f64() * factor).min(self.max_delay.as_secs_f64());
        Duration::from_secs_f64(secs.max(0.0))
    }
}

/// Execute a function with retries, retrying only errors accepted by `is_retryable`.
///
/// Returns the first success, the first non-retryable error, or the last
/// error once `max_attempts` is reached.
pub async fn with_retry_if<F, Fut, T, E, P>(config: &RetryConfig, mut f: F, mut is_retryable: P) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    P: FnMut(&E) -> bool,
{
    let mut attempt = 0;

    loop {
        attempt += 1;

        match f().await {
            Ok(result) => {
                if attempt > 1 {
                    tracing::info!(attempts = attempt, "Operation succeeded after retry");
                }
                return Ok(result);
            }
            Err(e) if !is_retryable(&e) => {
                tracing::debug!(error = %e, "Error is not retryable, returning immediately");
                return Err(e);
            }
            Err(e) if attempt >= config.max_attempts => {
                tracing::error!(attempts = attempt, error = %e, "All retry attempts exhausted");
                return Err(e);
            }
            Err(e) => {
                let delay = config.delay_after(attempt);
                tracing::warn!(
                    attempt = attempt,
                    max_attempts = config.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Attempt failed, retrying"
                );
                sleep(delay).await;
            }
        }
    }
}
