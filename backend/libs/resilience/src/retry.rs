/// Retry policy with exponential backoff, keyed on error classification
use rand::Rng;
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Classification hook: transient failures are retried, permanent ones are not
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Delay before the first retry
    pub base_delay: Duration,
    /// Maximum backoff duration
    pub max_backoff: Duration,
    /// Backoff multiplier for exponential backoff
    pub backoff_multiplier: f64,
    /// Add random jitter to backoff (±30%)
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(250),
            max_backoff: Duration::from_secs(8),
            backoff_multiplier: 2.0,
            jitter: false,
        }
    }
}

impl RetryConfig {
    /// Delay after the failed attempt with zero-based index `attempt`
    ///
    /// `base_delay * multiplier^attempt`, capped at `max_backoff`.
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let millis = self.base_delay.as_millis() as f64 * self.backoff_multiplier.powi(exponent);
        let capped = millis.min(self.max_backoff.as_millis() as f64);
        Duration::from_millis(capped as u64)
    }
}

/// Successful outcome together with what it cost
#[derive(Debug, Clone, PartialEq)]
pub struct Retried<T> {
    pub value: T,
    /// Attempts actually used (1 = succeeded first time)
    pub attempts: u32,
    /// Total time spent in backoff
    pub waited: Duration,
}

#[derive(Debug, thiserror::Error)]
pub enum RetryError<E> {
    #[error("Gave up after {attempts} attempts: {error}")]
    Exhausted { attempts: u32, error: E },
    #[error("Permanent failure on attempt {attempts}: {error}")]
    Permanent { attempts: u32, error: E },
}

impl<E> RetryError<E> {
    pub fn attempts(&self) -> u32 {
        match self {
            RetryError::Exhausted { attempts, .. } | RetryError::Permanent { attempts, .. } => {
                *attempts
            }
        }
    }

    pub fn error(&self) -> &E {
        match self {
            RetryError::Exhausted { error, .. } | RetryError::Permanent { error, .. } => error,
        }
    }

    /// The terminal error, whichever way the loop stopped
    pub fn into_inner(self) -> E {
        match self {
            RetryError::Exhausted { error, .. } | RetryError::Permanent { error, .. } => error,
        }
    }
}

/// Per-invocation state; never shared between calls
#[derive(Debug, Default)]
struct RetryState {
    attempt: u32,
    last_error: Option<String>,
    delay: Duration,
    waited: Duration,
}

/// Execute a future with retry logic
///
/// Runs `f` up to `config.max_attempts` times (at least once). A permanent error stops
/// the loop immediately; a retryable one suspends on a timer for the backoff delay and
/// tries again. There is no wait after the final attempt.
pub async fn with_retry<F, Fut, T, E>(
    config: &RetryConfig,
    mut f: F,
) -> Result<Retried<T>, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Retryable + fmt::Display,
{
    let max_attempts = config.max_attempts.max(1);
    let mut state = RetryState::default();

    loop {
        let attempts = state.attempt + 1;

        match f().await {
            Ok(value) => {
                if let Some(last_error) = &state.last_error {
                    debug!(
                        attempts,
                        waited_ms = state.waited.as_millis() as u64,
                        last_error = %last_error,
                        "Recovered after retry"
                    );
                }
                return Ok(Retried {
                    value,
                    attempts,
                    waited: state.waited,
                });
            }
            Err(error) if !error.is_retryable() => {
                warn!(attempts, error = %error, "Permanent failure, not retrying");
                return Err(RetryError::Permanent { attempts, error });
            }
            Err(error) => {
                if attempts >= max_attempts {
                    warn!(attempts, error = %error, "Max attempts ({}) reached", max_attempts);
                    return Err(RetryError::Exhausted { attempts, error });
                }

                state.delay = calculate_backoff(config.backoff_for(state.attempt), config.jitter);

                warn!(
                    attempt = attempts,
                    max_attempts,
                    delay_ms = state.delay.as_millis() as u64,
                    error = %error,
                    "Transient failure, retrying"
                );

                tokio::time::sleep(state.delay).await;

                state.waited += state.delay;
                state.last_error = Some(error.to_string());
                state.attempt = attempts;
            }
        }
    }
}

fn calculate_backoff(base: Duration, jitter: bool) -> Duration {
    if jitter {
        let mut rng = rand::thread_rng();
        let jitter_factor = 1.0 + rng.gen_range(-0.3..0.3); // ±30%
        Duration::from_millis((base.as_millis() as f64 * jitter_factor) as u64)
    } else {
        base
    }
}
