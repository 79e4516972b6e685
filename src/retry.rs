//! Retry with exponential backoff for transient provider overload
//!
//! Only [`ApiError::Overloaded`] is retried. Every other failure, rate limits
//! included, returns on the first attempt.

use std::future::Future;
use std::time::Duration;

use log::warn;

use crate::error::{ApiError, Result};

/// How many times to try and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total invocations, the first one included
    pub max_attempts: u32,

    /// Delay before the second attempt; doubles after each retry
    pub initial_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    pub const fn new(max_attempts: u32, initial_delay: Duration) -> Self {
        Self {
            max_attempts,
            initial_delay,
        }
    }

    /// Delay after failed attempt `attempt` (1-based)
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.initial_delay
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
    }
}

/// Run `work` until it succeeds, fails with a non-overload error, or the
/// policy's attempts are used up.
///
/// Exhaustion yields [`ApiError::ServiceUnavailable`], which callers can tell
/// apart from a single overload response.
pub async fn with_overload_retry<T, F, Fut>(policy: RetryPolicy, mut work: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match work().await {
            Err(err) if err.is_overloaded() => {
                if attempt >= max_attempts {
                    warn!("Provider still overloaded after {} attempts", attempt);
                    return Err(ApiError::ServiceUnavailable { attempts: attempt }.into());
                }
                let delay = policy.delay_after(attempt);
                warn!(
                    "Provider overloaded (attempt {}/{}), retrying in {:?}",
                    attempt, max_attempts, delay
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            outcome => return outcome,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Provider};
    use std::sync::Arc;
    use std::sync::Mutex;
    use tokio::time::Instant;

    fn recorder() -> Arc<Mutex<Vec<Instant>>> {
        Arc::new(Mutex::new(Vec::new()))
    }

    #[test]
    fn test_delays_double() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_after(1), Duration::from_secs(1));
        assert_eq!(policy.delay_after(2), Duration::from_secs(2));
        assert_eq!(policy.delay_after(3), Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_on_third_attempt() {
        let calls = recorder();
        let log = calls.clone();

        let result = with_overload_retry(RetryPolicy::default(), || {
            let log = log.clone();
            async move {
                let mut log = log.lock().unwrap();
                log.push(Instant::now());
                if log.len() < 3 {
                    Err(ApiError::Overloaded.into())
                } else {
                    Ok("draft")
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "draft");
        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[1] - calls[0], Duration::from_secs(1));
        assert_eq!(calls[2] - calls[1], Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_is_service_unavailable() {
        let calls = recorder();
        let log = calls.clone();

        let result: Result<()> = with_overload_retry(RetryPolicy::default(), || {
            let log = log.clone();
            async move {
                log.lock().unwrap().push(Instant::now());
                Err(ApiError::Overloaded.into())
            }
        })
        .await;

        match result {
            Err(Error::Api(ApiError::ServiceUnavailable { attempts })) => assert_eq!(attempts, 3),
            other => panic!("Expected ServiceUnavailable, got {:?}", other),
        }
        assert_eq!(calls.lock().unwrap().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_other_errors_fail_immediately() {
        let calls = recorder();
        let log = calls.clone();

        let result: Result<()> = with_overload_retry(RetryPolicy::default(), || {
            let log = log.clone();
            async move {
                log.lock().unwrap().push(Instant::now());
                Err(ApiError::RateLimited {
                    provider: Provider::Twitter,
                    reset_at: None,
                }
                .into())
            }
        })
        .await;

        assert!(result.unwrap_err().is_rate_limit());
        assert_eq!(calls.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_attempt_policy() {
        let policy = RetryPolicy::new(1, Duration::from_millis(10));
        let result: Result<()> =
            with_overload_retry(policy, || async { Err(ApiError::Overloaded.into()) }).await;

        assert!(matches!(
            result,
            Err(Error::Api(ApiError::ServiceUnavailable { attempts: 1 }))
        ));
    }
}
