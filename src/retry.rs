//! Retry logic with exponential backoff
//!
//! Used by the orchestrator to re-issue failed store calls. Transient failures are
//! retried with an exponentially growing, optionally jittered delay; permanent
//! failures (protocol violations, local errors) are returned immediately.
//!
//! # Example
//!
//! ```no_run
//! use resilint::retry::{IsRetryable, retry_with_backoff};
//! use resilint::config::RetryConfig;
//! use tokio_util::sync::CancellationToken;
//!
//! #[derive(Debug)]
//! enum MyError {
//!     Transient,
//!     Permanent,
//! }
//!
//! impl std::fmt::Display for MyError {
//!     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
//!         write!(f, "{self:?}")
//!     }
//! }
//!
//! impl IsRetryable for MyError {
//!     fn is_retryable(&self) -> bool {
//!         matches!(self, MyError::Transient)
//!     }
//! }
//!
//! # async fn example() -> Result<(), MyError> {
//! let config = RetryConfig::default();
//! let cancel = CancellationToken::new();
//! let result = retry_with_backoff(
//!     &config,
//!     &cancel,
//!     || async {
//!         // Your operation here
//!         Ok::<_, MyError>(())
//!     },
//!     |_err, _attempt, _will_retry| {},
//! )
//! .await?;
//! # Ok(())
//! # }
//! ```

use crate::config::RetryConfig;
use crate::error::Error;
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Trait for errors that can be classified as retryable or not
///
/// Transient failures (timeouts, connection errors, non-200 statuses) return `true`.
/// Permanent failures (protocol violations, local errors) return `false`.
pub trait IsRetryable {
    /// Returns true if the error is transient and the operation should be retried
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for Error {
    fn is_retryable(&self) -> bool {
        match self {
            Error::Transport(_) | Error::Timeout { .. } => true,
            // Any non-200 is an ordinary failure; the identical request may succeed later
            Error::Status { .. } => true,
            // Contract mismatch: repeating the same request gets the same answer
            Error::ProtocolViolation { .. } => false,
            Error::Config { .. } => false,
            Error::Cancelled => false,
            Error::ShuttingDown => false,
        }
    }
}

/// Execute an async operation with exponential backoff retry logic
///
/// # Arguments
///
/// * `config` - Retry configuration (max attempts, delays, backoff multiplier, jitter)
/// * `cancel` - Once cancelled, no further attempts are started
/// * `operation` - Async closure that returns `Result<T, E>` where E implements IsRetryable
/// * `on_failure` - Called after every failed attempt with the error, the 1-based attempt
///   number, and whether another attempt follows
///
/// # Returns
///
/// Returns the successful result, or the last error once the error is permanent, the
/// attempts are exhausted, or `cancel` fires.
pub async fn retry_with_backoff<F, Fut, T, E, N>(
    config: &RetryConfig,
    cancel: &CancellationToken,
    mut operation: F,
    mut on_failure: N,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: IsRetryable + std::fmt::Display,
    N: FnMut(&E, u32, bool),
{
    let mut retries: u32 = 0;
    let mut delay = config.initial_delay;

    loop {
        let e = match operation().await {
            Ok(result) => {
                if retries > 0 {
                    tracing::info!(attempts = retries + 1, "Operation succeeded after retry");
                }
                return Ok(result);
            }
            Err(e) => e,
        };

        let within_limit = config.max_attempts.is_none_or(|max| retries < max);
        let will_retry = e.is_retryable() && within_limit && !cancel.is_cancelled();
        on_failure(&e, retries + 1, will_retry);

        if !will_retry {
            if !e.is_retryable() {
                tracing::error!(error = %e, "Operation failed with non-retryable error");
            } else if cancel.is_cancelled() {
                tracing::warn!(error = %e, attempts = retries + 1, "Retry abandoned on shutdown");
            } else {
                tracing::error!(
                    error = %e,
                    attempts = retries + 1,
                    "Operation failed after all retry attempts exhausted"
                );
            }
            return Err(e);
        }

        retries += 1;
        tracing::warn!(
            error = %e,
            attempt = retries,
            max_attempts = ?config.max_attempts,
            delay_ms = delay.as_millis(),
            "Operation failed, retrying"
        );

        if delay.is_zero() {
            // Immediate retry still yields so a failing loop cannot starve the runtime
            tokio::task::yield_now().await;
        } else {
            let jittered_delay = if config.jitter {
                add_jitter(delay)
            } else {
                delay
            };

            tokio::select! {
                _ = tokio::time::sleep(jittered_delay) => {}
                _ = cancel.cancelled() => {
                    tracing::warn!(error = %e, attempts = retries, "Retry abandoned on shutdown");
                    return Err(e);
                }
            }

            delay = next_delay(delay, config);
        }
    }
}

/// Grow `delay` by the backoff multiplier, capped at `max_delay`
///
/// A product too large for a `Duration` saturates to the cap.
fn next_delay(delay: Duration, config: &RetryConfig) -> Duration {
    let secs = delay.as_secs_f64() * config.backoff_multiplier;
    Duration::try_from_secs_f64(secs)
        .unwrap_or(config.max_delay)
        .min(config.max_delay)
}

/// Add random jitter to a delay to prevent thundering herd
///
/// Jitter is uniformly distributed between 0% and 100% of the delay.
/// This means the actual delay will be between `delay` and `2 * delay`.
fn add_jitter(delay: Duration) -> Duration {
    let mut rng = rand::thread_rng();
    let jitter_factor: f64 = rng.gen_range(0.0..=1.0);
    let jittered_secs = delay.as_secs_f64() * (1.0 + jitter_factor);
    Duration::try_from_secs_f64(jittered_secs).unwrap_or(delay)
}
