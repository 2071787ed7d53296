//! Unit tests for the timeout failover dispatcher

use vk_core::errors::DispatchError;
use vk_core::services::SmsServiceTrait;

use super::{code_args, destinations, mock_providers, TEMPLATE};
use crate::sms::TimeoutFailoverSmsService;

fn timeout(provider: &str) -> DispatchError {
    DispatchError::Timeout {
        provider: provider.to_string(),
    }
}

#[tokio::test]
async fn test_rotates_after_threshold_exceeded() {
    let (mocks, providers) = mock_providers(&["a", "b"]);
    let dispatcher = TimeoutFailoverSmsService::new(providers, 2).unwrap();
    mocks[0].set_failure(Some(timeout("a"))).await;

    // Three timeouts exceed a threshold of two
    for _ in 0..3 {
        let result = dispatcher.send(TEMPLATE, &code_args(), &destinations()).await;
        assert!(matches!(result, Err(DispatchError::Timeout { .. })));
        assert_eq!(dispatcher.active_index(), 0);
    }
    assert_eq!(dispatcher.consecutive_timeouts(), 3);

    dispatcher
        .send(TEMPLATE, &code_args(), &destinations())
        .await
        .unwrap();

    assert_eq!(dispatcher.active_index(), 1);
    assert_eq!(dispatcher.consecutive_timeouts(), 0);
    assert_eq!(mocks[1].get_message_count(), 1);
}

#[tokio::test]
async fn test_success_resets_streak() {
    let (mocks, providers) = mock_providers(&["a", "b"]);
    let dispatcher = TimeoutFailoverSmsService::new(providers, 2).unwrap();

    mocks[0].set_failure(Some(timeout("a"))).await;
    for _ in 0..2 {
        assert!(dispatcher
            .send(TEMPLATE, &code_args(), &destinations())
            .await
            .is_err());
    }
    mocks[0].set_failure(None).await;
    dispatcher
        .send(TEMPLATE, &code_args(), &destinations())
        .await
        .unwrap();

    assert_eq!(dispatcher.consecutive_timeouts(), 0);
    assert_eq!(dispatcher.active_index(), 0);
}

#[tokio::test]
async fn test_other_errors_do_not_count() {
    let (mocks, providers) = mock_providers(&["a", "b"]);
    let dispatcher = TimeoutFailoverSmsService::new(providers, 0).unwrap();
    mocks[0]
        .set_failure(Some(DispatchError::provider("a", "rejected")))
        .await;

    for _ in 0..3 {
        let result = dispatcher.send(TEMPLATE, &code_args(), &destinations()).await;
        assert!(matches!(result, Err(DispatchError::Provider { .. })));
    }

    assert_eq!(dispatcher.consecutive_timeouts(), 0);
    assert_eq!(dispatcher.active_index(), 0);
}

#[tokio::test]
async fn test_rotation_wraps_around() {
    let (mocks, providers) = mock_providers(&["a", "b"]);
    let dispatcher = TimeoutFailoverSmsService::new(providers, 0).unwrap();
    for mock in &mocks {
        mock.set_failure(Some(timeout(mock.provider_name()))).await;
    }

    // Threshold zero: every timeout moves the next send on
    assert!(dispatcher.send(TEMPLATE, &code_args(), &destinations()).await.is_err());
    assert!(dispatcher.send(TEMPLATE, &code_args(), &destinations()).await.is_err());
    assert_eq!(dispatcher.active_index(), 1);
    assert!(dispatcher.send(TEMPLATE, &code_args(), &destinations()).await.is_err());
    assert_eq!(dispatcher.active_index(), 0);
}

#[test]
fn test_rejects_empty_provider_list() {
    assert!(TimeoutFailoverSmsService::new(Vec::new(), 3).is_err());
}
