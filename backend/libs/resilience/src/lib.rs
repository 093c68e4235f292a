/// Resilience patterns for calls to unreliable external services
///
/// This library provides:
/// - **Retry**: Bounded exponential backoff that stops early on permanent failures
/// - **Deadline**: Caller deadlines that cancel in-flight work and map expiry into the
///   caller's error type
///
/// Retry decisions are delegated to the error type through [`Retryable`], so the
/// backoff algorithm never needs to know how failures are classified.
///
/// # Example: Provider call with retry
///
/// ```rust,no_run
/// use resilience::{with_retry, RetryConfig, Retryable};
///
/// #[derive(Debug)]
/// struct Flaky;
///
/// impl std::fmt::Display for Flaky {
///     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
///         f.write_str("flaky")
///     }
/// }
///
/// impl Retryable for Flaky {
///     fn is_retryable(&self) -> bool {
///         true
///     }
/// }
///
/// #[tokio::main]
/// async fn main() {
///     let result = with_retry(&RetryConfig::default(), || async {
///         // Your provider call here
///         Ok::<_, Flaky>("reply")
///     })
///     .await;
///
///     assert_eq!(result.unwrap().attempts, 1);
/// }
/// ```

pub mod retry;
pub mod timeout;

// Re-export main types for convenience
pub use retry::{with_retry, Retried, RetryConfig, RetryError, Retryable};
pub use timeout::{with_deadline, with_timeout_result, TimeoutError};
