//! Unit tests for the in-process verification code cache

use std::sync::Arc;
use std::time::Duration;

use tokio_test::{assert_ok, block_on};

use vk_core::domain::{CodePolicy, IssueOutcome, VerifyOutcome};
use vk_core::errors::StoreError;
use vk_core::services::CodeCacheTrait;

use crate::cache::MemoryCodeCache;

fn short_policy() -> CodePolicy {
    CodePolicy {
        cooldown: Duration::from_millis(200),
        max_attempts: 3,
        record_ttl: Duration::from_secs(2),
    }
}

#[tokio::test]
async fn test_issue_then_cooldown() {
    let cache = MemoryCodeCache::default();

    assert_eq!(
        cache.issue("login", "555-0100", "123456").await.unwrap(),
        IssueOutcome::Admitted
    );
    assert_eq!(
        cache.issue("login", "555-0100", "654321").await.unwrap(),
        IssueOutcome::Cooldown
    );

    // The rejected issuance did not overwrite the record
    assert_eq!(
        cache.verify("login", "555-0100", "123456").await.unwrap(),
        VerifyOutcome::Match
    );
}

#[test]
fn test_login_scenario() {
    let cache = MemoryCodeCache::default();

    block_on(async {
        let issued = assert_ok!(cache.issue("login", "555-0100", "123456").await);
        assert_eq!(issued, IssueOutcome::Admitted);

        let reissued = assert_ok!(cache.issue("login", "555-0100", "999999").await);
        assert_eq!(reissued, IssueOutcome::Cooldown);

        let wrong = assert_ok!(cache.verify("login", "555-0100", "000000").await);
        assert_eq!(wrong, VerifyOutcome::Mismatch);

        let right = assert_ok!(cache.verify("login", "555-0100", "123456").await);
        assert_eq!(right, VerifyOutcome::Match);
    });

    assert!(cache.is_empty());
}

#[tokio::test]
async fn test_reissue_after_cooldown_resets_record() {
    let cache = MemoryCodeCache::new(short_policy());

    cache.issue("login", "555-0100", "111111").await.unwrap();
    assert_eq!(
        cache.verify("login", "555-0100", "000000").await.unwrap(),
        VerifyOutcome::Mismatch
    );

    tokio::time::sleep(Duration::from_millis(250)).await;
    assert_eq!(
        cache.issue("login", "555-0100", "222222").await.unwrap(),
        IssueOutcome::Admitted
    );

    // Old code is gone and the attempt budget is full again
    for _ in 0..2 {
        assert_eq!(
            cache.verify("login", "555-0100", "111111").await.unwrap(),
            VerifyOutcome::Mismatch
        );
    }
    assert_eq!(
        cache.verify("login", "555-0100", "222222").await.unwrap(),
        VerifyOutcome::Match
    );
}

#[tokio::test]
async fn test_attempt_bound() {
    let cache = MemoryCodeCache::default();
    cache.issue("login", "555-0100", "123456").await.unwrap();

    let outcomes = [
        cache.verify("login", "555-0100", "000000").await.unwrap(),
        cache.verify("login", "555-0100", "000000").await.unwrap(),
        cache.verify("login", "555-0100", "000000").await.unwrap(),
        cache.verify("login", "555-0100", "000000").await.unwrap(),
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

    // The correct code no longer works either
    assert_eq!(
        cache.verify("login", "555-0100", "123456").await.unwrap(),
        VerifyOutcome::Mismatch
    );
}

#[tokio::test]
async fn test_match_is_terminal() {
    let cache = MemoryCodeCache::default();
    cache.issue("login", "555-0100", "123456").await.unwrap();

    assert_eq!(
        cache.verify("login", "555-0100", "123456").await.unwrap(),
        VerifyOutcome::Match
    );
    assert_eq!(
        cache.verify("login", "555-0100", "123456").await.unwrap(),
        VerifyOutcome::Mismatch
    );
    assert!(cache.is_empty());
}

#[tokio::test]
async fn test_expired_record_reads_as_mismatch() {
    let cache = MemoryCodeCache::new(CodePolicy {
        cooldown: Duration::from_millis(50),
        max_attempts: 3,
        record_ttl: Duration::from_millis(100),
    });
    cache.issue("login", "555-0100", "123456").await.unwrap();

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(
        cache.verify("login", "555-0100", "123456").await.unwrap(),
        VerifyOutcome::Mismatch
    );
}

#[tokio::test]
async fn test_purge_expired() {
    let cache = MemoryCodeCache::new(CodePolicy {
        cooldown: Duration::from_millis(10),
        max_attempts: 3,
        record_ttl: Duration::from_millis(50),
    });
    cache.issue("login", "555-0100", "123456").await.unwrap();
    cache.issue("login", "555-0101", "123456").await.unwrap();
    assert_eq!(cache.len(), 2);

    tokio::time::sleep(Duration::from_millis(80)).await;
    cache.purge_expired();
    assert!(cache.is_empty());
}

#[tokio::test]
async fn test_scopes_do_not_collide() {
    let cache = MemoryCodeCache::default();
    cache.issue("login", "555-0100", "111111").await.unwrap();
    assert_eq!(
        cache.issue("reset_password", "555-0100", "222222").await.unwrap(),
        IssueOutcome::Admitted
    );
    assert_eq!(
        cache.verify("reset_password", "555-0100", "111111").await.unwrap(),
        VerifyOutcome::Mismatch
    );
}

#[tokio::test]
async fn test_empty_key_parts_rejected() {
    let cache = MemoryCodeCache::default();
    assert!(matches!(
        cache.issue("", "555-0100", "123456").await,
        Err(StoreError::InvalidKey(_))
    ));
    assert!(matches!(
        cache.verify("login", "", "123456").await,
        Err(StoreError::InvalidKey(_))
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_issue_admits_exactly_one() {
    let cache = Arc::new(MemoryCodeCache::default());

    let handles: Vec<_> = (0..32)
        .map(|i| {
            let cache = cache.clone();
            tokio::spawn(async move {
                cache
                    .issue("login", "555-0100", &format!("{:06}", i))
                    .await
                    .unwrap()
            })
        })
        .collect();

    let mut admitted = 0;
    for handle in handles {
        if handle.await.unwrap() == IssueOutcome::Admitted {
            admitted += 1;
        }
    }
    assert_eq!(admitted, 1);
}
