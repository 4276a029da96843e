use std::future::Future;
use std::time::Duration;

use crate::error::{AppError, AppResult};

/// Tagged result of one fallback strategy
#[derive(Debug, Clone, PartialEq)]
pub enum TierOutcome<T> {
    Success(T),
    Failure(String),
}

impl<T> TierOutcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, TierOutcome::Success(_))
    }

    pub fn into_result(self) -> Result<T, String> {
        match self {
            TierOutcome::Success(value) => Ok(value),
            TierOutcome::Failure(reason) => Err(reason),
        }
    }
}

/// Timeout and retry policy shared by every upstream call.
///
/// Each attempt is bounded by `timeout`; a timed out attempt counts as a
/// failure like any other error. After `retries + 1` failed attempts the
/// outcome is a `Failure` carrying the last error message.
#[derive(Debug, Clone, Copy)]
pub struct FallbackPolicy {
    pub timeout: Duration,
    pub retries: u32,
}

impl FallbackPolicy {
    pub fn new(timeout: Duration, retries: u32) -> Self {
        Self { timeout, retries }
    }

    pub async fn attempt<T, F, Fut>(&self, label: &str, mut operation: F) -> TierOutcome<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        let attempts = self.retries.saturating_add(1);
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            let error = match tokio::time::timeout(self.timeout, operation()).await {
                Ok(Ok(value)) => return TierOutcome::Success(value),
                Ok(Err(e)) => e,
                Err(_) => AppError::Timeout(format!(
                    "{} did not respond within {}ms",
                    label,
                    self.timeout.as_millis()
                )),
            };

            tracing::debug!(
                upstream = %label,
                attempt = attempt,
                max_attempts = attempts,
                error = %error,
                "Upstream attempt failed"
            );
            last_error = error.to_string();
        }

        TierOutcome::Failure(last_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_attempt_success() {
        let policy = FallbackPolicy::new(Duration::from_millis(100), 0);
        let outcome = policy.attempt("test", || async { Ok::<_, AppError>(7) }).await;
        assert_eq!(outcome, TierOutcome::Success(7));
    }

    #[tokio::test]
    async fn test_attempt_timeout_is_failure() {
        let policy = FallbackPolicy::new(Duration::from_millis(20), 0);
        let outcome = policy
            .attempt("slow upstream", || async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok::<_, AppError>(1)
            })
            .await;

        let reason = tokio_test::assert_err!(outcome.into_result());
        assert!(reason.contains("slow upstream"));
        assert!(reason.contains("20ms"));
    }

    #[tokio::test]
    async fn test_attempt_retries_until_success() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let policy = FallbackPolicy::new(Duration::from_millis(100), 2);

        let outcome = policy
            .attempt("flaky", move || async move {
                let call = calls.fetch_add(1, Ordering::SeqCst);
                if call < 2 {
                    Err(AppError::ExternalApi(format!("failure {}", call)))
                } else {
                    Ok("ok")
                }
            })
            .await;

        assert!(outcome.is_success());
        assert_eq!(tokio_test::assert_ok!(outcome.into_result()), "ok");
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_attempt_reports_last_error() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let policy = FallbackPolicy::new(Duration::from_millis(100), 1);

        let outcome: TierOutcome<()> = policy
            .attempt("broken", move || async move {
                let call = calls.fetch_add(1, Ordering::SeqCst);
                Err(AppError::ExternalApi(format!("failure {}", call)))
            })
            .await;

        assert_eq!(
            outcome,
            TierOutcome::Failure("External API error: failure 1".to_string())
        );
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }
}
