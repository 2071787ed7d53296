//! Unit tests for the in-process sliding window limiter

use std::sync::Arc;
use std::time::Duration;

use vk_core::errors::StoreError;
use vk_core::services::RateLimiterTrait;
use vk_shared::RateWindowConfig;

use crate::ratelimit::MemorySlidingWindowLimiter;

#[tokio::test]
async fn test_admits_up_to_rate_then_limits() {
    let limiter = MemorySlidingWindowLimiter::new(Duration::from_secs(1), 5);

    for _ in 0..5 {
        assert!(!limiter.limit("sms:dispatch").await.unwrap());
    }
    assert!(limiter.limit("sms:dispatch").await.unwrap());
    assert!(limiter.limit("sms:dispatch").await.unwrap());
}

#[tokio::test]
async fn test_window_slides() {
    let limiter = MemorySlidingWindowLimiter::new(Duration::from_millis(300), 2);

    assert!(!limiter.limit("k").await.unwrap());
    assert!(!limiter.limit("k").await.unwrap());
    assert!(limiter.limit("k").await.unwrap());

    tokio::time::sleep(Duration::from_millis(350)).await;
    assert!(!limiter.limit("k").await.unwrap());
}

#[tokio::test]
async fn test_rejections_are_not_recorded() {
    let limiter = MemorySlidingWindowLimiter::new(Duration::from_millis(300), 1);

    assert!(!limiter.limit("k").await.unwrap());
    tokio::time::sleep(Duration::from_millis(200)).await;
    // Limited attempt must not extend the window
    assert!(limiter.limit("k").await.unwrap());
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(!limiter.limit("k").await.unwrap());
}

#[tokio::test]
async fn test_keys_are_independent() {
    let limiter = MemorySlidingWindowLimiter::new(Duration::from_secs(1), 1);

    assert!(!limiter.limit("sms:dest:555-0100").await.unwrap());
    assert!(!limiter.limit("sms:dest:555-0101").await.unwrap());
    assert!(limiter.limit("sms:dest:555-0100").await.unwrap());
}

#[tokio::test]
async fn test_zero_rate_always_limits() {
    let limiter = MemorySlidingWindowLimiter::new(Duration::from_secs(1), 0);
    assert!(limiter.limit("k").await.unwrap());
    assert!(limiter.limit("k").await.unwrap());
}

#[tokio::test]
async fn test_empty_key_rejected() {
    let limiter = MemorySlidingWindowLimiter::new(Duration::from_secs(1), 1);
    assert!(matches!(
        limiter.limit("").await,
        Err(StoreError::InvalidKey(_))
    ));
}

#[tokio::test]
async fn test_idle_keys_are_swept() {
    let limiter = MemorySlidingWindowLimiter::from_config(&RateWindowConfig::new(
        Duration::from_millis(50),
        10,
    ));
    limiter.limit("a").await.unwrap();
    limiter.limit("b").await.unwrap();
    assert_eq!(limiter.tracked_keys(), 2);

    tokio::time::sleep(Duration::from_millis(80)).await;
    limiter.sweep_idle();
    assert_eq!(limiter.tracked_keys(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_admissions_bounded() {
    let limiter = Arc::new(MemorySlidingWindowLimiter::new(Duration::from_secs(5), 10));

    let handles: Vec<_> = (0..50)
        .map(|_| {
            let limiter = limiter.clone();
            tokio::spawn(async move { limiter.limit("sms:dispatch").await.unwrap() })
        })
        .collect();

    let mut admitted = 0;
    for handle in handles {
        if !handle.await.unwrap() {
            admitted += 1;
        }
    }
    assert_eq!(admitted, 10);
}
