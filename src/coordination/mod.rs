//! Coordination primitives shared by every tool
//!
//! - `RateLimiter`: token bucket throttling outbound calls
//! - `RetryPolicy`: exponential backoff with jitter around fallible calls
//! - `BoundedCache`: LRU memoization, opt-in per tool

pub mod cache;
pub mod rate_limiter;
pub mod retry;

pub use cache::{BoundedCache, CacheEntry};
pub use rate_limiter::RateLimiter;
pub use retry::RetryPolicy;
