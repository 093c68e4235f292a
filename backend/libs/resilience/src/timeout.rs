/// Deadlines for calls to external services
///
/// Expiry drops the wrapped future, which cancels whatever it was waiting on: an
/// in-flight HTTP request or a pending backoff timer.
use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;
use tracing::warn;

#[derive(Debug, Clone, thiserror::Error)]
pub enum TimeoutError {
    #[error("Operation timed out after {0:?}")]
    Elapsed(Duration),
    #[error("Operation failed: {0}")]
    OperationFailed(String),
}

/// Run a fallible pipeline under a caller deadline
///
/// The pipeline's own errors pass through untouched. On expiry `on_expiry` builds the
/// caller's error from the deadline, so the result stays in the caller's error type.
pub async fn with_deadline<F, T, E, X>(deadline: Duration, future: F, on_expiry: X) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
    X: FnOnce(Duration) -> E,
{
    match timeout(deadline, future).await {
        Ok(result) => result,
        Err(_) => {
            warn!(deadline_ms = deadline.as_millis() as u64, "Deadline exceeded, operation dropped");
            Err(on_expiry(deadline))
        }
    }
}

/// Bound a single check, flattening its error into a message
///
/// Meant for probes where the caller only needs to know whether the check passed.
pub async fn with_timeout_result<F, T, E>(duration: Duration, future: F) -> Result<T, TimeoutError>
where
    F: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    match timeout(duration, future).await {
        Ok(Ok(result)) => Ok(result),
        Ok(Err(e)) => Err(TimeoutError::OperationFailed(e.to_string())),
        Err(_) => Err(TimeoutError::Elapsed(duration)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_deadline_passes_result_through() {
        let ok = with_deadline(
            Duration::from_secs(1),
            async { Ok::<_, String>(42) },
            |_| "expired".to_string(),
        )
        .await;
        assert_eq!(ok, Ok(42));

        let failed = with_deadline(
            Duration::from_secs(1),
            async { Err::<i32, _>("invalid api key".to_string()) },
            |_| "expired".to_string(),
        )
        .await;
        assert_eq!(failed, Err("invalid api key".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_expiry_uses_caller_error() {
        let start = tokio::time::Instant::now();

        let result = with_deadline(
            Duration::from_millis(10),
            async {
                tokio::time::sleep(Duration::from_secs(1)).await;
                Ok::<i32, String>(42)
            },
            |deadline| format!("timed out after {}ms", deadline.as_millis()),
        )
        .await;

        assert_eq!(result, Err("timed out after 10ms".to_string()));
        assert_eq!(start.elapsed(), Duration::from_millis(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_result_operation_failed() {
        let result = with_timeout_result(Duration::from_secs(1), async {
            Err::<i32, _>("connection refused")
        })
        .await;

        match result {
            Err(TimeoutError::OperationFailed(message)) => {
                assert_eq!(message, "connection refused")
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_result_elapsed() {
        let result = with_timeout_result(Duration::from_millis(5), async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            Ok::<(), String>(())
        })
        .await;

        assert!(matches!(result, Err(TimeoutError::Elapsed(d)) if d == Duration::from_millis(5)));
        assert!(TimeoutError::Elapsed(Duration::from_secs(5))
            .to_string()
            .contains("timed out"));
    }
}
