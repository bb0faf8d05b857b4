//! Client-side rate limiter for Binance API requests
//!
//! Token bucket: a full bucket on construction allows a cold-start burst of
//! `capacity` calls, after which calls are admitted at `refill_rate` per second.
//! One limiter is shared per upstream category (spot, futures).

use parking_lot::Mutex;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Longest single sleep while waiting for a token
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Shortest sleep while waiting, avoids spinning on sub-millisecond deficits
const MIN_WAIT: Duration = Duration::from_millis(1);

/// Mutable bucket state, only touched under the limiter lock
#[derive(Debug)]
struct TokenBucket {
    tokens: f64,
    last_refill: Instant,
}

impl TokenBucket {
    /// Credits `elapsed * refill_rate` tokens, capped at `capacity`
    fn refill(&mut self, capacity: f64, refill_rate: f64, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * refill_rate).min(capacity);
        self.last_refill = now;
    }
}

/// Token-bucket rate limiter for outbound REST requests
///
/// `acquire()` never fails; it suspends the caller until a token is available.
/// There is no queue timeout and no cancellation hook.
#[derive(Debug)]
pub struct RateLimiter {
    capacity: f64,
    refill_rate: f64,
    bucket: Mutex<TokenBucket>,
}

impl RateLimiter {
    /// Create a limiter holding `capacity` tokens, refilled at `refill_rate` tokens/second
    ///
    /// Both values are expected to be positive. A zero refill rate means a drained
    /// bucket never admits another call.
    pub fn new(capacity: f64, refill_rate: f64) -> Self {
        Self {
            capacity,
            refill_rate,
            bucket: Mutex::new(TokenBucket {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
        }
    }

    /// Configured bucket capacity
    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    /// Configured refill rate in tokens per second
    pub fn refill_rate(&self) -> f64 {
        self.refill_rate
    }

    /// Wait until a token is available, then debit it
    ///
    /// Each attempt refills the bucket from the elapsed time. When the bucket is
    /// empty the caller sleeps until the next whole token is due, but never longer
    /// than the 100ms poll interval, then recomputes.
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut bucket = self.bucket.lock();
                bucket.refill(self.capacity, self.refill_rate, Instant::now());

                if bucket.tokens >= 1.0 {
                    bucket.tokens -= 1.0;
                    debug!(remaining = bucket.tokens, "Rate limit permission granted");
                    return;
                }

                self.time_to_next_token(bucket.tokens)
            };

            tokio::time::sleep(wait).await;
        }
    }

    /// Take a token if one is available right now (non-blocking)
    ///
    /// Returns true if the token was debited, false if the bucket is empty.
    pub fn try_acquire(&self) -> bool {
        let mut bucket = self.bucket.lock();
        bucket.refill(self.capacity, self.refill_rate, Instant::now());

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Current token balance after crediting elapsed refill
    pub fn available_tokens(&self) -> f64 {
        let mut bucket = self.bucket.lock();
        bucket.refill(self.capacity, self.refill_rate, Instant::now());
        bucket.tokens
    }

    fn time_to_next_token(&self, tokens: f64) -> Duration {
        let deficit = 1.0 - tokens;
        if self.refill_rate <= 0.0 || !self.refill_rate.is_finite() {
            return POLL_INTERVAL;
        }

        let secs = deficit / self.refill_rate;
        if !secs.is_finite() || secs >= POLL_INTERVAL.as_secs_f64() {
            POLL_INTERVAL
        } else {
            Duration::from_secs_f64(secs).max(MIN_WAIT)
        }
    }
}

impl Default for RateLimiter {
    /// 10 token burst, 10 tokens/second
    fn default() -> Self {
        Self::new(10.0, 10.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_full_bucket_on_construction() {
        let limiter = RateLimiter::new(5.0, 1.0);
        assert!((limiter.available_tokens() - 5.0).abs() < 0.01);
    }

    #[tokio::test]
    async fn test_try_acquire_drains_bucket() {
        let limiter = RateLimiter::new(3.0, 0.1);

        assert!(limiter.try_acquire());
        assert!(limiter.try_acquire());
        assert!(limiter.try_acquire());

        // Next immediate check should fail
        assert!(!limiter.try_acquire());
    }

    #[tokio::test]
    async fn test_refill_never_exceeds_capacity() {
        let limiter = RateLimiter::new(2.0, 1000.0);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(limiter.available_tokens() <= 2.0);
    }

    #[test]
    fn test_wait_is_capped_at_poll_interval() {
        let slow = RateLimiter::new(1.0, 0.5);
        assert_eq!(slow.time_to_next_token(0.0), POLL_INTERVAL);

        let fast = RateLimiter::new(1.0, 100.0);
        let wait = fast.time_to_next_token(0.5);
        assert!(wait >= Duration::from_millis(4) && wait <= Duration::from_millis(6));

        let stalled = RateLimiter::new(1.0, 0.0);
        assert_eq!(stalled.time_to_next_token(0.0), POLL_INTERVAL);
    }
}
