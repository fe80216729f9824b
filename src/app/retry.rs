use crate::config::RetryConfig;
use crate::utils::error::Result;
use std::future::Future;
use std::time::Duration;

/// Caller-side retry. The client itself never retries; schedulers and the
/// CLI wrap operations in this when they want to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub times: u32,
    pub delay: Duration,
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            times: config.times,
            delay: Duration::from_millis(config.delay_ms),
        }
    }
}

/// Runs `operation`, retrying throttle and transport failures up to
/// `policy.times` more times with a fixed delay. Service rejections are
/// returned at once.
pub async fn retry_with_policy<T, F, Fut>(policy: RetryPolicy, mut operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt < policy.times => {
                attempt += 1;
                tracing::warn!(
                    "🔁 Attempt {} failed ({}), retrying in {:?}",
                    attempt,
                    e,
                    policy.delay
                );
                tokio::time::sleep(policy.delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::BrtError;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast(times: u32) -> RetryPolicy {
        RetryPolicy {
            times,
            delay: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn test_transport_errors_are_retried() {
        let calls = AtomicU32::new(0);

        let result = retry_with_policy(fast(3), || async {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(BrtError::transport("connection reset"))
            } else {
                Ok("00000000000")
            }
        })
        .await;

        tokio_test::assert_ok!(&result);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_policy_times() {
        let calls = AtomicU32::new(0);

        let result: Result<()> = retry_with_policy(fast(2), || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(BrtError::throttled("BRT minute quota exceeded"))
        })
        .await;

        tokio_test::assert_err!(&result);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_service_rejections_are_not_retried() {
        let calls = AtomicU32::new(0);

        let result: Result<()> = retry_with_policy(fast(5), || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(BrtError::Outcome {
                code: -11,
                reason: "Shipment not found".to_string(),
            })
        })
        .await;

        assert_eq!(result.unwrap_err().code(), Some(-11));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_policy_from_config() {
        let policy = RetryPolicy::from(&RetryConfig::default());
        assert_eq!(policy.times, 3);
        assert_eq!(policy.delay, Duration::from_millis(400));
    }
}
