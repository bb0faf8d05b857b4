//! Retry with exponential backoff and jitter
//!
//! Every error is treated as retryable. After the last attempt the most recent
//! error is returned to the caller unchanged.

use rand::Rng;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Default number of retries after the first attempt
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default backoff base
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(300);

/// Exponential backoff policy for fallible async operations
///
/// Delay before retry `n` (1-indexed) is `base_delay * 2^(n-1)` plus a uniform
/// jitter in `[0, base_delay)`. The first attempt runs without delay, so an
/// operation is invoked at most `max_retries + 1` times.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Backoff base
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// Total number of invocations before giving up
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Deterministic part of the delay before retry `retry` (1-indexed)
    pub fn backoff(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(31);
        self.base_delay.saturating_mul(1u32 << exponent)
    }

    /// Full delay before retry `retry`, jitter included
    pub fn delay_for(&self, retry: u32) -> Duration {
        let jitter = self.base_delay.mul_f64(rand::thread_rng().gen::<f64>());
        self.backoff(retry).saturating_add(jitter)
    }

    /// Retry number that follows `retry`, or `None` once the budget is spent
    fn next_retry(&self, retry: u32) -> Option<u32> {
        let next = retry.saturating_add(1);
        (next <= self.max_retries).then_some(next)
    }

    /// Run `operation`, retrying on failure
    ///
    /// # Returns
    /// The first successful value, or the error from the final attempt
    pub async fn run<T, E, F, Fut>(&self, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let mut retry = 0u32;

        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    retry = match self.next_retry(retry) {
                        Some(next) => next,
                        None => return Err(err),
                    };

                    let delay = self.delay_for(retry);
                    warn!(
                        attempt = retry,
                        max_retries = self.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Operation failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RETRIES, DEFAULT_BASE_DELAY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles() {
        let policy = RetryPolicy::new(3, Duration::from_millis(300));
        assert_eq!(policy.backoff(1), Duration::from_millis(300));
        assert_eq!(policy.backoff(2), Duration::from_millis(600));
        assert_eq!(policy.backoff(3), Duration::from_millis(1200));
    }

    #[test]
    fn test_jitter_within_base() {
        let policy = RetryPolicy::new(3, Duration::from_millis(100));
        for _ in 0..50 {
            let delay = policy.delay_for(2);
            assert!(delay >= Duration::from_millis(200));
            assert!(delay < Duration::from_millis(300));
        }
    }

    #[test]
    fn test_backoff_saturates() {
        let policy = RetryPolicy::new(u32::MAX, Duration::from_secs(1));
        assert!(policy.backoff(200) >= Duration::from_secs(1 << 31));
        assert_eq!(policy.max_attempts(), u32::MAX);
    }

    #[test]
    fn test_retry_counter_stops_at_budget() {
        let policy = RetryPolicy::new(3, Duration::from_millis(1));
        assert_eq!(policy.next_retry(0), Some(1));
        assert_eq!(policy.next_retry(2), Some(3));
        assert_eq!(policy.next_retry(3), None);

        let unbounded = RetryPolicy::new(u32::MAX, Duration::from_millis(1));
        assert_eq!(unbounded.next_retry(u32::MAX - 1), Some(u32::MAX));
        assert_eq!(unbounded.next_retry(u32::MAX), Some(u32::MAX));
    }

    #[tokio::test]
    async fn test_zero_retries_runs_once() {
        let policy = RetryPolicy::new(0, Duration::from_millis(1));
        let mut calls = 0;
        let result: Result<(), String> = policy
            .run(|| {
                calls += 1;
                async { Err("boom".to_string()) }
            })
            .await;

        assert_eq!(result.unwrap_err(), "boom");
        assert_eq!(calls, 1);
    }
}
