//! Bounded retry with exponential backoff for calls to remote collaborators.
//! Only errors that report themselves as transient are retried.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

/// Backoff schedule for one remote operation.
#[derive(Clone, Debug)]
pub struct RetryConfig {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub backoff_multiplier: f64,
    pub add_jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(10),
            backoff_multiplier: 2.0,
            add_jitter: true,
        }
    }
}

impl RetryConfig {
    /// Delay before retry number `attempt` (zero based): the initial backoff
    /// grown geometrically, capped at `max_backoff`, plus up to a quarter of
    /// jitter when enabled.
    fn backoff_duration(&self, attempt: u32) -> Duration {
        let grown_ms = self.initial_backoff.as_millis() as f64
            * self.backoff_multiplier.powi(attempt as i32);
        let base = Duration::from_millis(grown_ms.round() as u64).min(self.max_backoff);
        if !self.add_jitter {
            return base;
        }
        let jitter_ms = base.as_millis() as f64 * 0.25 * jitter_fraction();
        base + Duration::from_millis(jitter_ms as u64)
    }
}

/// A fraction in [0, 1) taken from the sub-second clock.
fn jitter_fraction() -> f64 {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or_default();
    f64::from(nanos % 1000) / 1000.0
}

/// Errors that know whether another attempt may succeed.
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

/// Runs `f` until it succeeds, fails with a permanent error, or has been
/// retried `config.max_retries` times.
///
/// # Example
/// ```ignore
/// let retry = RetryConfig {
///     max_retries: config.max_retries,
///     initial_backoff: Duration::from_millis(config.initial_backoff_ms),
///     ..RetryConfig::default()
/// };
/// let result = retry_async(&retry, "backup_upsert", || async {
///     store.upsert(owner_id, &blob, now).await
/// })
/// .await;
/// ```
pub async fn retry_async<F, Fut, T, E>(
    config: &RetryConfig,
    operation_name: &str,
    f: F,
) -> Result<T, E>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Retryable + Display,
{
    let mut retries = 0;
    loop {
        let err = match f().await {
            Ok(value) => {
                if retries > 0 {
                    info!(operation = operation_name, retries, "Recovered after retry");
                }
                return Ok(value);
            }
            Err(err) => err,
        };

        if !err.is_retryable() {
            warn!(operation = operation_name, error = %err, "Permanent failure, not retrying");
            return Err(err);
        }
        if retries >= config.max_retries {
            warn!(operation = operation_name, retries, error = %err, "Giving up, retries exhausted");
            return Err(err);
        }

        let delay = config.backoff_duration(retries);
        warn!(
            operation = operation_name,
            retry = retries + 1,
            delay_ms = delay.as_millis() as u64,
            error = %err,
            "Transient failure, backing off"
        );
        sleep(delay).await;
        retries += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug)]
    struct TestError {
        transient: bool,
    }

    impl Display for TestError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "transient={}", self.transient)
        }
    }

    impl Retryable for TestError {
        fn is_retryable(&self) -> bool {
            self.transient
        }
    }

    fn fast() -> RetryConfig {
        RetryConfig {
            max_retries: 2,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(2),
            backoff_multiplier: 2.0,
            add_jitter: false,
        }
    }

    #[test]
    fn test_backoff_grows_then_caps() {
        let config = RetryConfig {
            max_backoff: Duration::from_millis(300),
            add_jitter: false,
            ..Default::default()
        };

        assert_eq!(config.backoff_duration(0), Duration::from_millis(100));
        assert_eq!(config.backoff_duration(1), Duration::from_millis(200));
        assert_eq!(config.backoff_duration(2), Duration::from_millis(300));
    }

    #[test]
    fn test_jitter_adds_at_most_a_quarter() {
        let config = RetryConfig::default();
        let delay = config.backoff_duration(0);
        assert!(delay >= Duration::from_millis(100));
        assert!(delay <= Duration::from_millis(125));
    }

    #[tokio::test]
    async fn test_retry_success_first_attempt() {
        let result = retry_async(&fast(), "test_op", || async { Ok::<_, TestError>(42) }).await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_permanent_failure_is_not_retried() {
        let calls = AtomicU32::new(0);
        let result = retry_async(&fast(), "test_op", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<i32, _>(TestError { transient: false }) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_transient_failure_stops_at_max_retries() {
        let calls = AtomicU32::new(0);
        let result = retry_async(&fast(), "test_op", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<i32, _>(TestError { transient: true }) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_transient_failure_then_success() {
        let calls = AtomicU32::new(0);
        let result = retry_async(&fast(), "test_op", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Err(TestError { transient: true })
                } else {
                    Ok(7)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
