//! Exponential backoff for whole payment attempts.
//!
//! Nothing in the client retries by itself. Hosts that want retries wrap a
//! complete attempt (fresh login included) in [`retry_with_backoff`], which
//! only repeats errors that report [`BarneysError::is_retryable`]. A GCash
//! cash-in that may have reached the processor is never repeated.

use std::future::Future;
use std::time::Duration;

use crate::{BarneysError, Result};

/// Backoff parameters.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use barneys_lib::retry::RetryPolicy;
///
/// let policy = RetryPolicy::with_max_attempts(5);
/// assert_eq!(policy.max_attempts, 5);
/// assert_eq!(policy.initial_delay, Duration::from_millis(500));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, the first one included (default: 3)
    pub max_attempts: u32,
    /// Delay before the first retry (default: 500ms)
    pub initial_delay: Duration,
    /// Upper bound for any delay (default: 10s)
    pub max_delay: Duration,
    /// Growth factor between retries (default: 2.0)
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Default policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Default policy with `max_attempts` attempts.
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Self::default()
        }
    }

    /// Policy that never retries.
    pub fn none() -> Self {
        Self::with_max_attempts(1)
    }

    /// Delay after the failed attempt number `attempt` (0-based).
    ///
    /// The error's own hint is used as a floor; the result never exceeds
    /// `max_delay`.
    pub fn delay_for(&self, attempt: u32, error: &BarneysError) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let backoff_ms = self.initial_delay.as_millis() as f64 * self.backoff_multiplier.powi(exponent);
        let backoff = if backoff_ms.is_finite() && backoff_ms >= 0.0 {
            Duration::from_millis(backoff_ms as u64)
        } else {
            self.max_delay
        };
        let hint = error
            .retry_after_ms()
            .map(Duration::from_millis)
            .unwrap_or_default();
        backoff.max(hint).min(self.max_delay)
    }
}

/// Run `operation` until it succeeds, fails with a non-retryable error, or
/// `policy.max_attempts` is reached.
///
/// A policy with zero attempts still runs the operation once.
pub async fn retry_with_backoff<F, Fut, T>(policy: &RetryPolicy, mut operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        let error = match operation().await {
            Ok(value) => {
                #[cfg(feature = "tracing")]
                if attempt > 0 {
                    tracing::info!(attempt = attempt + 1, "payment attempt succeeded after retry");
                }
                return Ok(value);
            }
            Err(error) => error,
        };

        attempt += 1;
        if !error.is_retryable() || attempt >= max_attempts {
            return Err(error);
        }

        let delay = policy.delay_for(attempt - 1, &error);
        #[cfg(feature = "tracing")]
        tracing::warn!(
            attempt,
            max_attempts,
            delay_ms = delay.as_millis() as u64,
            error = %error,
            "payment attempt failed, retrying"
        );
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;
    use crate::errors::Cause;
    use crate::transport::TransportError;

    fn transient() -> BarneysError {
        BarneysError::Auth {
            cause: Cause::Transport(TransportError::Network("reset".into())),
        }
    }

    fn fast() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
            backoff_multiplier: 2.0,
        }
    }

    #[tokio::test]
    async fn test_retries_transient_errors() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result = retry_with_backoff(&fast(), move || async move {
            if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(transient())
            } else {
                Ok("done")
            }
        })
        .await;
        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<()> = retry_with_backoff(&fast(), move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(transient())
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_does_not_retry_permanent_errors() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<()> = retry_with_backoff(&fast(), move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(BarneysError::Auth {
                cause: Cause::Transport(TransportError::Remote {
                    status: 401,
                    body: "bad credentials".into(),
                }),
            })
        })
        .await;
        assert_eq!(result.unwrap_err().remote_status(), Some(401));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_zero_attempts_runs_once() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let policy = RetryPolicy::with_max_attempts(0);
        let _: Result<()> = retry_with_backoff(&policy, move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(transient())
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_delay_growth_and_cap() {
        let policy = RetryPolicy {
            max_attempts: 5,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(1500),
            backoff_multiplier: 2.0,
        };
        let permanent = BarneysError::Host("x".into());
        assert_eq!(policy.delay_for(0, &permanent), Duration::from_millis(100));
        assert_eq!(policy.delay_for(2, &permanent), Duration::from_millis(400));
        assert_eq!(policy.delay_for(10, &permanent), Duration::from_millis(1500));

        // network errors hint 1000ms
        assert_eq!(policy.delay_for(0, &transient()), Duration::from_millis(1000));
    }
}
