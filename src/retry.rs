//! Retry handling for LLM calls.
//!
//! Generation output is non-deterministic, so schema mismatches and
//! transient provider failures are rerun with the same prompt, with
//! exponential backoff between attempts.

use std::time::Duration;

use rand::Rng;
use tokio::time::sleep;

use crate::error::{EngineError, Result};

/// Retry policy configuration.
///
/// `max_retries` counts extra attempts after the first one, so a policy
/// with `max_retries = 2` makes at most 3 calls.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Extra attempts after the first.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Upper bound for the backoff delay.
    pub max_delay: Duration,
    /// Backoff multiplier (for exponential backoff).
    pub backoff_multiplier: f64,
    /// Whether to randomize delays.
    pub use_jitter: bool,
    /// Maximum jitter as a fraction of the delay (0.0 to 1.0).
    pub jitter_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: crate::config::DEFAULT_MAX_RETRIES,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
            backoff_multiplier: 2.0,
            use_jitter: true,
            jitter_factor: 0.1,
        }
    }
}

impl RetryPolicy {
    /// Policy with the given retry budget and default backoff.
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    /// Policy that retries without waiting. Useful in tests.
    pub fn immediate(max_retries: u32) -> Self {
        Self {
            max_retries,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            use_jitter: false,
            ..Self::default()
        }
    }

    /// Set the initial delay.
    pub const fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Set the maximum delay.
    pub const fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Set the backoff multiplier.
    pub const fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Enable or disable jitter.
    pub const fn with_jitter(mut self, use_jitter: bool) -> Self {
        self.use_jitter = use_jitter;
        self
    }

    /// Total attempt budget.
    pub fn attempts(&self) -> u32 {
        self.max_retries + 1
    }

    /// Delay applied after the given 1-based attempt fails.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1);
        let base = self.initial_delay.as_millis() as f64
            * self.backoff_multiplier.powi(exponent as i32);
        let delay = Duration::from_millis(base as u64).min(self.max_delay);

        if self.use_jitter {
            self.add_jitter(delay)
        } else {
            delay
        }
    }

    fn add_jitter(&self, delay: Duration) -> Duration {
        let jitter_range = delay.as_millis() as f64 * self.jitter_factor;
        if jitter_range <= 0.0 {
            return delay;
        }
        let jitter = rand::thread_rng().gen_range(-jitter_range..=jitter_range);
        let with_jitter = delay.as_millis() as f64 + jitter;
        Duration::from_millis(with_jitter.max(0.0) as u64)
    }

    /// Run `operation` until it succeeds, fails with a non-retryable error,
    /// or the attempt budget is exhausted.
    ///
    /// The closure receives the 1-based attempt number. Terminal failures
    /// are wrapped in [`EngineError::Generation`] carrying the last cause
    /// and the number of attempts actually made.
    pub async fn run<T, F, Fut>(&self, what: &'static str, mut operation: F) -> Result<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let total = self.attempts();
        let mut attempt = 0;
        loop {
            attempt += 1;
            let error = match operation(attempt).await {
                Ok(value) => {
                    if attempt > 1 {
                        tracing::info!(operation = what, attempt, "succeeded after retrying");
                    }
                    return Ok(value);
                }
                Err(error) => error,
            };

            if !error.is_retryable() || attempt >= total {
                tracing::warn!(operation = what, attempt, error = %error, "giving up");
                return Err(EngineError::exhausted(attempt, error));
            }

            let delay = self.delay_for(attempt);
            tracing::warn!(
                operation = what,
                attempt,
                total,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "attempt failed, retrying"
            );
            sleep(delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn success_on_first_attempt_makes_one_call() {
        let counter = Arc::new(AtomicU32::new(0));
        let calls = counter.clone();

        let result = RetryPolicy::immediate(2)
            .run("test", |_| {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok("done")
                }
            })
            .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn success_on_final_attempt_is_a_normal_result() {
        let counter = Arc::new(AtomicU32::new(0));
        let calls = counter.clone();

        let result = RetryPolicy::immediate(2)
            .run("test", |_| {
                let calls = calls.clone();
                async move {
                    let count = calls.fetch_add(1, Ordering::SeqCst);
                    if count < 2 {
                        Err(EngineError::parse("malformed output"))
                    } else {
                        Ok("done")
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhaustion_wraps_the_last_error() {
        let counter = Arc::new(AtomicU32::new(0));
        let calls = counter.clone();

        let result: Result<()> = RetryPolicy::immediate(2)
            .run("test", |_| {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(EngineError::provider("openai", "server error"))
                }
            })
            .await;

        assert_eq!(counter.load(Ordering::SeqCst), 3);
        match result.unwrap_err() {
            EngineError::Generation { attempts, source } => {
                assert_eq!(attempts, 3);
                assert!(matches!(*source, EngineError::Provider { .. }));
            }
            other => panic!("unexpected error variant: {other:?}"),
        }
    }

    #[tokio::test]
    async fn non_retryable_errors_stop_immediately() {
        let counter = Arc::new(AtomicU32::new(0));
        let calls = counter.clone();

        let result: Result<()> = RetryPolicy::immediate(5)
            .run("test", |_| {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(EngineError::configuration("no keys"))
                }
            })
            .await;

        assert_eq!(counter.load(Ordering::SeqCst), 1);
        match result.unwrap_err() {
            EngineError::Generation { attempts, source } => {
                assert_eq!(attempts, 1);
                assert!(matches!(*source, EngineError::Configuration(_)));
            }
            other => panic!("unexpected error variant: {other:?}"),
        }
    }

    #[test]
    fn delay_grows_exponentially_and_caps() {
        let policy = RetryPolicy::new(5)
            .with_initial_delay(Duration::from_millis(100))
            .with_max_delay(Duration::from_millis(350))
            .with_backoff_multiplier(2.0)
            .with_jitter(false);

        assert_eq!(policy.delay_for(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for(2), Duration::from_millis(200));
        assert_eq!(policy.delay_for(3), Duration::from_millis(350));
        assert_eq!(policy.delay_for(4), Duration::from_millis(350));
    }

    #[test]
    fn attempt_budget_is_one_plus_retries() {
        assert_eq!(RetryPolicy::new(0).attempts(), 1);
        assert_eq!(RetryPolicy::new(2).attempts(), 3);
    }
}
