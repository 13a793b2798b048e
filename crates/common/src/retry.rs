//! Retry with exponential backoff and jitter
//!
//! A failing operation is re-attempted up to `max_retries` additional times
//! (so `max_retries + 1` attempts total). The delay before retry `n`
//! (0-based) is `base_delay * 2^n` plus a random jitter bounded by
//! `max_jitter`. A [`RetryPolicy`] decides per error whether retrying is
//! worthwhile; a stop decision propagates the original error immediately.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::{debug, warn};

/// Backoff and attempt configuration
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Number of retries after the initial attempt
    pub max_retries: u32,
    /// Base delay doubled per attempt
    pub base_delay: Duration,
    /// Upper bound for the random jitter added to each delay
    pub max_jitter: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            max_jitter: Duration::from_secs(1),
        }
    }
}

impl RetryConfig {
    /// Profile for constrained mobile links: fewer attempts
    pub fn mobile() -> Self {
        Self { max_retries: 2, ..Self::default() }
    }

    /// Delay before retry `attempt` (0-based): `base * 2^attempt + jitter`
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        // Cap the exponent so the multiplier cannot overflow.
        let multiplier = 2u32.saturating_pow(attempt.min(10));
        let backoff = self.base_delay.saturating_mul(multiplier);

        let jitter_ms = self.max_jitter.as_millis() as u64;
        let jitter = if jitter_ms == 0 {
            Duration::ZERO
        } else {
            Duration::from_millis(rand::thread_rng().gen_range(0..=jitter_ms))
        };

        backoff.saturating_add(jitter)
    }
}

/// Decides whether an error is worth retrying
pub trait RetryPolicy<E> {
    /// Return `true` to retry after `error` on 0-based `attempt`
    fn should_retry(&self, error: &E, attempt: u32) -> bool;
}

/// Retries on every error until attempts run out
#[derive(Debug, Clone, Copy)]
pub struct AlwaysRetry;

impl<E> RetryPolicy<E> for AlwaysRetry {
    fn should_retry(&self, _error: &E, _attempt: u32) -> bool {
        true
    }
}

/// Predicate-backed policy for structural retry decisions
#[derive(Debug)]
pub struct PredicateRetry<F> {
    predicate: F,
}

impl<F> PredicateRetry<F> {
    /// Wrap a predicate of `(error, attempt) -> bool`
    pub fn new(predicate: F) -> Self {
        Self { predicate }
    }
}

impl<F, E> RetryPolicy<E> for PredicateRetry<F>
where
    F: Fn(&E, u32) -> bool,
{
    fn should_retry(&self, error: &E, attempt: u32) -> bool {
        (self.predicate)(error, attempt)
    }
}

/// Run `operation` with retry; the final failure is the operation's own error
///
/// Total attempts are `config.max_retries + 1`. The policy is consulted
/// before each retry; a stop decision (or exhaustion) returns the last
/// error unchanged.
pub async fn retry_with_backoff<T, E, P, F, Fut>(
    config: &RetryConfig,
    policy: &P,
    mut operation: F,
) -> Result<T, E>
where
    P: RetryPolicy<E>,
    E: fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt: u32 = 0;
    loop {
        match operation().await {
            Ok(value) => {
                if attempt > 0 {
                    debug!(attempt = attempt + 1, "operation succeeded after retry");
                }
                return Ok(value);
            }
            Err(error) => {
                if attempt >= config.max_retries {
                    warn!(attempts = attempt + 1, error = %error, "retry attempts exhausted");
                    return Err(error);
                }
                if !policy.should_retry(&error, attempt) {
                    debug!(error = %error, "error is not retryable");
                    return Err(error);
                }

                let delay = config.delay_for_attempt(attempt);
                warn!(
                    attempt = attempt + 1,
                    delay_ms = delay.as_millis() as u64,
                    error = %error,
                    "operation failed, backing off before retry"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use super::*;

    fn instant_config(max_retries: u32) -> RetryConfig {
        RetryConfig {
            max_retries,
            base_delay: Duration::from_millis(1),
            max_jitter: Duration::ZERO,
        }
    }

    #[test]
    fn delay_doubles_per_attempt_without_jitter() {
        let config = RetryConfig {
            max_retries: 3,
            base_delay: Duration::from_millis(100),
            max_jitter: Duration::ZERO,
        };

        assert_eq!(config.delay_for_attempt(0), Duration::from_millis(100));
        assert_eq!(config.delay_for_attempt(1), Duration::from_millis(200));
        assert_eq!(config.delay_for_attempt(2), Duration::from_millis(400));
    }

    #[test]
    fn jitter_stays_within_bound() {
        let config = RetryConfig {
            max_retries: 3,
            base_delay: Duration::from_millis(100),
            max_jitter: Duration::from_millis(50),
        };

        for _ in 0..20 {
            let delay = config.delay_for_attempt(1);
            assert!(delay >= Duration::from_millis(200));
            assert!(delay <= Duration::from_millis(250));
        }
    }

    #[test]
    fn exponent_is_capped_against_overflow() {
        let config = RetryConfig {
            max_retries: 100,
            base_delay: Duration::from_secs(1),
            max_jitter: Duration::ZERO,
        };
        // Must not panic; saturates instead.
        let _ = config.delay_for_attempt(u32::MAX);
    }

    #[test]
    fn mobile_profile_has_fewer_retries() {
        assert_eq!(RetryConfig::mobile().max_retries, 2);
        assert_eq!(RetryConfig::default().max_retries, 3);
    }

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let attempts = Arc::new(AtomicU32::new(0));
        let attempts_clone = attempts.clone();

        let result = retry_with_backoff(&instant_config(3), &AlwaysRetry, || {
            let attempts = attempts_clone.clone();
            async move {
                if attempts.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err("transient".to_string())
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        assert_eq!(result, Ok(42));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhaustion_makes_exactly_max_retries_plus_one_attempts() {
        let attempts = Arc::new(AtomicU32::new(0));
        let attempts_clone = attempts.clone();

        let result: Result<(), String> =
            retry_with_backoff(&instant_config(3), &AlwaysRetry, || {
                let attempts = attempts_clone.clone();
                async move {
                    attempts.fetch_add(1, Ordering::SeqCst);
                    Err("persistent".to_string())
                }
            })
            .await;

        assert_eq!(result, Err("persistent".to_string()));
        assert_eq!(attempts.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn stop_decision_prevents_any_retry() {
        let attempts = Arc::new(AtomicU32::new(0));
        let attempts_clone = attempts.clone();
        let policy = PredicateRetry::new(|error: &String, _| !error.contains("401"));

        let result: Result<(), String> = retry_with_backoff(&instant_config(5), &policy, || {
            let attempts = attempts_clone.clone();
            async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err("HTTP 401".to_string())
            }
        })
        .await;

        assert_eq!(result, Err("HTTP 401".to_string()));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn policy_can_stop_midway() {
        let attempts = Arc::new(AtomicU32::new(0));
        let attempts_clone = attempts.clone();
        let policy = PredicateRetry::new(|_: &String, attempt| attempt < 1);

        let result: Result<(), String> = retry_with_backoff(&instant_config(5), &policy, || {
            let attempts = attempts_clone.clone();
            async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err("flaky".to_string())
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }
}
