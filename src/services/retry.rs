//! Retry with exponential backoff and jitter for fallible async operations.
//!
//! Independent of the request cache: wrap a fetch function with
//! [`RetryPolicy::execute`] before handing it to the cache if the fetch
//! should survive transient failures.

use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::domain::models::RetryConfig;

/// Spread applied around each delay, as a fraction of the delay.
const JITTER_FACTOR: f64 = 0.5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self::new(config.max_retries, config.initial_backoff_ms, config.max_backoff_ms)
    }
}

impl RetryPolicy {
    pub const fn new(max_retries: u32, initial_backoff_ms: u64, max_backoff_ms: u64) -> Self {
        Self {
            max_retries,
            initial_backoff_ms,
            max_backoff_ms,
        }
    }

    /// A policy that makes exactly one attempt.
    pub const fn none() -> Self {
        Self::new(0, 0, 0)
    }

    /// Delay before retry `attempt` (0-indexed), without jitter:
    /// `min(initial * 2^attempt, max)`.
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let backoff_ms = self
            .initial_backoff_ms
            .saturating_mul(2_u64.saturating_pow(attempt))
            .min(self.max_backoff_ms);

        Duration::from_millis(backoff_ms)
    }

    fn schedule(&self) -> ExponentialBackoff {
        let mut schedule = ExponentialBackoff {
            initial_interval: Duration::from_millis(self.initial_backoff_ms),
            current_interval: Duration::from_millis(self.initial_backoff_ms),
            max_interval: Duration::from_millis(self.max_backoff_ms),
            randomization_factor: JITTER_FACTOR,
            multiplier: 2.0,
            max_elapsed_time: None,
            ..ExponentialBackoff::default()
        };
        schedule.reset();
        schedule
    }

    /// Run `operation`, retrying every error until retries run out.
    pub async fn execute<F, Fut, T, E>(&self, operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        self.execute_when(operation, |_| true).await
    }

    /// Run `operation`, retrying only errors for which `retryable` holds.
    pub async fn execute_when<F, Fut, T, E, P>(&self, mut operation: F, retryable: P) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
        P: Fn(&E) -> bool,
    {
        let mut schedule = self.schedule();
        let mut attempt = 0;

        loop {
            match operation().await {
                Ok(result) => {
                    if attempt > 0 {
                        debug!(retries = attempt, "operation succeeded after retrying");
                    }
                    return Ok(result);
                }
                Err(err) => {
                    if attempt >= self.max_retries {
                        if self.max_retries > 0 {
                            warn!(attempts = attempt + 1, error = %err, "giving up after retries");
                        }
                        return Err(err);
                    }
                    if !retryable(&err) {
                        debug!(error = %err, "permanent error, not retrying");
                        return Err(err);
                    }

                    let delay = schedule
                        .next_backoff()
                        .unwrap_or_else(|| self.base_delay(attempt))
                        .min(Duration::from_millis(self.max_backoff_ms));
                    warn!(
                        attempt = attempt + 1,
                        max_retries = self.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "attempt failed, retrying"
                    );

                    sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_base_delay_doubles_until_cap() {
        let policy = RetryPolicy::new(5, 200, 1_000);

        assert_eq!(policy.base_delay(0), Duration::from_millis(200));
        assert_eq!(policy.base_delay(1), Duration::from_millis(400));
        assert_eq!(policy.base_delay(2), Duration::from_millis(800));
        assert_eq!(policy.base_delay(3), Duration::from_millis(1_000));
        assert_eq!(policy.base_delay(40), Duration::from_millis(1_000));
    }

    #[test]
    fn test_from_config() {
        let config = RetryConfig {
            max_retries: 4,
            initial_backoff_ms: 50,
            max_backoff_ms: 500,
        };
        assert_eq!(RetryPolicy::from(&config), RetryPolicy::new(4, 50, 500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_until_success() {
        let policy = RetryPolicy::new(3, 100, 1_000);
        let calls = Arc::new(AtomicU32::new(0));

        let c = Arc::clone(&calls);
        let result: Result<&str, String> = policy
            .execute(|| {
                let c = Arc::clone(&c);
                async move {
                    if c.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err("connection reset".to_string())
                    } else {
                        Ok("ok")
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_retries() {
        let policy = RetryPolicy::new(2, 10, 100);
        let calls = Arc::new(AtomicU32::new(0));

        let c = Arc::clone(&calls);
        let result: Result<(), String> = policy
            .execute(|| {
                c.fetch_add(1, Ordering::SeqCst);
                async { Err("still down".to_string()) }
            })
            .await;

        assert_eq!(result.unwrap_err(), "still down");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_permanent_error_is_not_retried() {
        let policy = RetryPolicy::new(5, 10, 100);
        let calls = Arc::new(AtomicU32::new(0));

        let c = Arc::clone(&calls);
        let result: Result<(), String> = policy
            .execute_when(
                || {
                    c.fetch_add(1, Ordering::SeqCst);
                    async { Err("invalid agent".to_string()) }
                },
                |e| e.contains("timeout"),
            )
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_none_makes_one_attempt() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let _: Result<(), String> = RetryPolicy::none()
            .execute(|| {
                c.fetch_add(1, Ordering::SeqCst);
                async { Err("nope".to_string()) }
            })
            .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
