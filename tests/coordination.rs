// Integration tests for the in-process coordination layer
//
// Covers the timing-sensitive behavior of the rate limiter and retry policy
// plus LRU eviction order of the bounded cache.

use crypto_binance_provider::coordination::{BoundedCache, RateLimiter, RetryPolicy};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[tokio::test]
async fn test_limiter_burst_then_wait() {
    let limiter = RateLimiter::new(10.0, 10.0);

    let start = Instant::now();
    for _ in 0..10 {
        limiter.acquire().await;
    }
    assert!(
        start.elapsed() < Duration::from_millis(50),
        "a full bucket should serve its capacity immediately"
    );

    let before_eleventh = Instant::now();
    limiter.acquire().await;
    let waited = before_eleventh.elapsed();
    assert!(waited >= Duration::from_millis(80), "waited only {:?}", waited);
    assert!(waited < Duration::from_secs(1), "waited {:?}", waited);
}

#[tokio::test]
async fn test_limiter_shared_across_tasks() {
    let limiter = Arc::new(RateLimiter::new(3.0, 20.0));

    let start = Instant::now();
    let handles: Vec<_> = (0..6)
        .map(|_| {
            let limiter = limiter.clone();
            tokio::spawn(async move { limiter.acquire().await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap();
    }

    // 3 immediate tokens, 3 more at 20/s
    assert!(start.elapsed() >= Duration::from_millis(100));
}

#[tokio::test]
async fn test_retry_exhaustion_runs_four_attempts() {
    let policy = RetryPolicy::new(3, Duration::from_millis(5));
    let calls = AtomicU32::new(0);

    let result: Result<(), String> = policy
        .run(|| {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            async move { Err(format!("failure {}", n)) }
        })
        .await;

    assert_eq!(calls.load(Ordering::SeqCst), 4);
    assert_eq!(result.unwrap_err(), "failure 4");
}

#[tokio::test]
async fn test_retry_succeeds_on_third_call() {
    let policy = RetryPolicy::new(3, Duration::from_millis(5));
    let calls = AtomicU32::new(0);

    let result: Result<&str, String> = policy
        .run(|| {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if n < 3 {
                    Err("transient".to_string())
                } else {
                    Ok("done")
                }
            }
        })
        .await;

    assert_eq!(result.unwrap(), "done");
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_retry_waits_between_attempts() {
    let policy = RetryPolicy::new(2, Duration::from_millis(20));

    let start = Instant::now();
    let _: Result<(), &str> = policy.run(|| async { Err("nope") }).await;

    // 20ms + 40ms of backoff at minimum
    assert!(start.elapsed() >= Duration::from_millis(60));
}

#[test]
fn test_cache_evicts_least_recently_used() {
    let cache = BoundedCache::new(2);
    cache.set("a", 1);
    cache.set("b", 2);

    assert_eq!(cache.get("a"), Some(1));
    let evicted = cache.set("c", 3);

    assert_eq!(evicted.as_deref(), Some("b"));
    assert!(cache.has("a"));
    assert!(!cache.has("b"));
    assert!(cache.has("c"));
    assert_eq!(cache.len(), 2);
}

#[test]
fn test_cache_has_does_not_touch() {
    let cache = BoundedCache::new(2);
    cache.set("a", 1);
    cache.set("b", 2);

    assert!(cache.has("a"));
    cache.set("c", 3);

    assert!(!cache.has("a"));
    assert!(cache.has("b"));
}
