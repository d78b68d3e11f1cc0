use std::future::Future;
use std::time::Duration;

use crate::error::{DashboardError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
    pub backoff: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay: Duration::from_millis(1000),
            backoff: 2,
        }
    }
}

impl RetryPolicy {
    /// Pause after the given failed attempt (1-based) before the next one.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = self.backoff.saturating_pow(attempt.saturating_sub(1));
        self.delay.saturating_mul(factor)
    }
}

/// Runs `op` up to `policy.attempts` times. Each attempt is cancelled once
/// `timeout` elapses. Non-retryable errors return immediately.
pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    timeout: Duration,
    endpoint: &str,
    mut op: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let attempts = policy.attempts.max(1);
    let mut last_error = None;

    for attempt in 1..=attempts {
        let outcome = match tokio::time::timeout(timeout, op()).await {
            Ok(result) => result,
            Err(_) => Err(DashboardError::Timeout {
                timeout_ms: timeout.as_millis(),
                endpoint: endpoint.to_string(),
            }),
        };

        let err = match outcome {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        if !err.is_retryable() {
            tracing::debug!(endpoint, attempt, error = %err, "Request failed, not retrying");
            return Err(err);
        }

        if attempt < attempts {
            let delay = policy.delay_after(attempt);
            tracing::warn!(
                endpoint,
                attempt,
                attempts,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "API request failed, retrying"
            );
            tokio::time::sleep(delay).await;
        }
        last_error = Some(err);
    }

    let err = last_error.unwrap_or(DashboardError::InvalidResponse);
    tracing::error!(endpoint, attempts, error = %err, "API request failed after all attempts");
    Err(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn fast_policy(attempts: u32) -> RetryPolicy {
        RetryPolicy {
            attempts,
            delay: Duration::from_millis(1),
            backoff: 2,
        }
    }

    #[test]
    fn delay_grows_exponentially() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_after(1), Duration::from_millis(1000));
        assert_eq!(policy.delay_after(2), Duration::from_millis(2000));
        assert_eq!(policy.delay_after(3), Duration::from_millis(4000));
    }

    #[tokio::test]
    async fn exhausts_configured_attempts() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: Result<()> = with_retry(&fast_policy(4), Duration::from_secs(1), "/x", || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(DashboardError::Status {
                    status: 502,
                    body: "bad gateway".into(),
                    endpoint: "/x".into(),
                })
            }
        })
        .await;

        assert!(matches!(result, Err(DashboardError::Status { status: 502, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn client_error_stops_after_first_attempt() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: Result<()> = with_retry(&fast_policy(3), Duration::from_secs(1), "/x", || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(DashboardError::Status {
                    status: 404,
                    body: "not found".into(),
                    endpoint: "/x".into(),
                })
            }
        })
        .await;

        assert!(matches!(result, Err(DashboardError::Status { status: 404, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn recovers_on_later_attempt() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result = with_retry(&fast_policy(3), Duration::from_secs(1), "/x", || {
            let counter = counter.clone();
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(DashboardError::InvalidResponse)
                } else {
                    Ok("jobs")
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "jobs");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn timeouts_are_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: Result<()> =
            with_retry(&fast_policy(2), Duration::from_millis(20), "/slow", || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(500)).await;
                    Ok(())
                }
            })
            .await;

        assert!(matches!(result, Err(DashboardError::Timeout { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
