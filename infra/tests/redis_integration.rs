//! Integration tests for the Redis-backed code cache and sliding window limiter
//!
//! Run with a Redis server available:
//! `REDIS_URL=redis://localhost:6379 cargo test -p vk_infra -- --ignored`

use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;
use vk_core::domain::{CodePolicy, IssueOutcome, VerifyOutcome};
use vk_core::services::{CodeCacheTrait, RateLimiterTrait};
use vk_infra::cache::{RedisClient, RedisCodeCache};
use vk_infra::ratelimit::RedisSlidingWindowLimiter;
use vk_shared::CacheConfig;

async fn client() -> RedisClient {
    let url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());
    RedisClient::new(CacheConfig::new(url).with_prefix("vk_it"))
        .await
        .expect("Failed to connect to Redis")
}

fn unique_scope() -> String {
    format!("it-{}", Uuid::new_v4())
}

fn short_policy() -> CodePolicy {
    CodePolicy {
        cooldown: Duration::from_millis(300),
        max_attempts: 3,
        record_ttl: Duration::from_secs(5),
    }
}

#[tokio::test]
#[ignore] // Requires Redis to be running
async fn test_issue_respects_cooldown() {
    let cache = RedisCodeCache::new(client().await, short_policy());
    let scope = unique_scope();

    assert_eq!(
        cache.issue(&scope, "5550100", "111111").await.unwrap(),
        IssueOutcome::Admitted
    );
    assert_eq!(
        cache.issue(&scope, "5550100", "222222").await.unwrap(),
        IssueOutcome::Cooldown
    );

    // The first code is still the live one
    assert_eq!(
        cache.verify(&scope, "5550100", "111111").await.unwrap(),
        VerifyOutcome::Match
    );

    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(
        cache.issue(&scope, "5550100", "333333").await.unwrap(),
        IssueOutcome::Admitted
    );
}

#[tokio::test]
#[ignore] // Requires Redis to be running
async fn test_login_scenario() {
    let redis = client().await;
    let cache = RedisCodeCache::new(redis.clone(), CodePolicy::default());
    let scope = unique_scope();

    assert_eq!(
        cache.issue(&scope, "555-0100", "123456").await.unwrap(),
        IssueOutcome::Admitted
    );
    assert_eq!(
        cache.issue(&scope, "555-0100", "999999").await.unwrap(),
        IssueOutcome::Cooldown
    );
    assert_eq!(
        cache.verify(&scope, "555-0100", "000000").await.unwrap(),
        VerifyOutcome::Mismatch
    );
    assert_eq!(
        cache.verify(&scope, "555-0100", "123456").await.unwrap(),
        VerifyOutcome::Match
    );

    let key = cache.record_key(&scope, "555-0100").unwrap();
    assert!(!redis.exists(&key).await.unwrap());
}

#[tokio::test]
#[ignore] // Requires Redis to be running
async fn test_record_expires_with_ttl() {
    let redis = client().await;
    let cache = RedisCodeCache::new(redis.clone(), short_policy());
    let scope = unique_scope();

    cache.issue(&scope, "5550100", "111111").await.unwrap();

    let key = cache.record_key(&scope, "5550100").unwrap();
    let ttl = redis.pttl(&key).await.unwrap().expect("record should expire");
    assert!(ttl > 0 && ttl <= 5000);
}

#[tokio::test]
#[ignore] // Requires Redis to be running
async fn test_attempts_are_bounded() {
    let redis = client().await;
    let cache = RedisCodeCache::new(redis.clone(), short_policy());
    let scope = unique_scope();

    cache.issue(&scope, "5550100", "111111").await.unwrap();

    let outcomes = [
        cache.verify(&scope, "5550100", "000000").await.unwrap(),
        cache.verify(&scope, "5550100", "000000").await.unwrap(),
        cache.verify(&scope, "5550100", "000000").await.unwrap(),
        cache.verify(&scope, "5550100", "111111").await.unwrap(),
    ];

    assert_eq!(
        outcomes,
        [
            VerifyOutcome::Mismatch,
            VerifyOutcome::Mismatch,
            VerifyOutcome::AttemptsExhausted,
            VerifyOutcome::Mismatch,
        ]
    );
    let key = cache.record_key(&scope, "5550100").unwrap();
    assert!(!redis.exists(&key).await.unwrap());
}

#[tokio::test]
#[ignore] // Requires Redis to be running
async fn test_match_is_terminal() {
    let cache = RedisCodeCache::new(client().await, short_policy());
    let scope = unique_scope();

    cache.issue(&scope, "5550100", "111111").await.unwrap();

    assert_eq!(
        cache.verify(&scope, "5550100", "111111").await.unwrap(),
        VerifyOutcome::Match
    );
    assert_eq!(
        cache.verify(&scope, "5550100", "111111").await.unwrap(),
        VerifyOutcome::Mismatch
    );
}

#[tokio::test]
#[ignore] // Requires Redis to be running
async fn test_scopes_are_isolated() {
    let cache = RedisCodeCache::new(client().await, short_policy());
    let login = unique_scope();
    let reset = unique_scope();

    cache.issue(&login, "5550100", "111111").await.unwrap();
    assert_eq!(
        cache.issue(&reset, "5550100", "222222").await.unwrap(),
        IssueOutcome::Admitted
    );
    assert_eq!(
        cache.verify(&reset, "5550100", "111111").await.unwrap(),
        VerifyOutcome::Mismatch
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore] // Requires Redis to be running
async fn test_concurrent_issue_admits_one() {
    let cache = Arc::new(RedisCodeCache::new(client().await, short_policy()));
    let scope = unique_scope();

    let mut handles = Vec::new();
    for i in 0..16 {
        let cache = cache.clone();
        let scope = scope.clone();
        handles.push(tokio::spawn(async move {
            cache
                .issue(&scope, "5550100", &format!("{:06}", i))
                .await
                .unwrap()
        }));
    }

    let mut admitted = 0;
    for handle in handles {
        if handle.await.unwrap() == IssueOutcome::Admitted {
            admitted += 1;
        }
    }
    assert_eq!(admitted, 1);
}

#[tokio::test]
#[ignore] // Requires Redis to be running
async fn test_sliding_window_limits() {
    let limiter = RedisSlidingWindowLimiter::new(client().await, Duration::from_millis(500), 3);
    let key = unique_scope();

    for _ in 0..3 {
        assert!(!limiter.limit(&key).await.unwrap());
    }
    assert!(limiter.limit(&key).await.unwrap());

    tokio::time::sleep(Duration::from_millis(600)).await;
    assert!(!limiter.limit(&key).await.unwrap());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore] // Requires Redis to be running
async fn test_sliding_window_concurrent_bound() {
    let limiter = Arc::new(RedisSlidingWindowLimiter::new(
        client().await,
        Duration::from_secs(10),
        5,
    ));
    let key = unique_scope();

    let mut handles = Vec::new();
    for _ in 0..20 {
        let limiter = limiter.clone();
        let key = key.clone();
        handles.push(tokio::spawn(async move { limiter.limit(&key).await.unwrap() }));
    }

    let mut allowed = 0;
    for handle in handles {
        if !handle.await.unwrap() {
            allowed += 1;
        }
    }
    assert_eq!(allowed, 5);
}
