//! Unit tests for SMS module

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use vk_core::errors::StoreError;
use vk_core::services::{RateLimiterTrait, SmsServiceTrait};

use crate::sms::MockSmsService;

mod timeout_failover_tests;

pub(super) const TEMPLATE: &str = "verification_code";
pub(super) const PHONE: &str = "+14155550100";

/// Limiter with a fixed answer that counts how often it was consulted
pub(super) struct FixedLimiter {
    reply: Result<bool, StoreError>,
    calls: AtomicU64,
    keys: std::sync::Mutex<Vec<String>>,
}

impl FixedLimiter {
    pub(super) fn allowing() -> Arc<Self> {
        Self::with_reply(Ok(false))
    }

    pub(super) fn limiting() -> Arc<Self> {
        Self::with_reply(Ok(true))
    }

    pub(super) fn failing() -> Arc<Self> {
        Self::with_reply(Err(StoreError::Unavailable("connection refused".to_string())))
    }

    fn with_reply(reply: Result<bool, StoreError>) -> Arc<Self> {
        Arc::new(Self {
            reply,
            calls: AtomicU64::new(0),
            keys: std::sync::Mutex::new(Vec::new()),
        })
    }

    pub(super) fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    pub(super) fn keys(&self) -> Vec<String> {
        self.keys.lock().unwrap().clone()
    }
}

#[async_trait]
impl RateLimiterTrait for FixedLimiter {
    async fn limit(&self, key: &str) -> Result<bool, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.keys.lock().unwrap().push(key.to_string());
        self.reply.clone()
    }
}

/// Named mock providers plus the same set as trait objects
pub(super) fn mock_providers(names: &[&str]) -> (Vec<MockSmsService>, Vec<Arc<dyn SmsServiceTrait>>) {
    let mocks: Vec<MockSmsService> = names.iter().map(|n| MockSmsService::named(*n)).collect();
    let providers = mocks
        .iter()
        .map(|m| Arc::new(m.clone()) as Arc<dyn SmsServiceTrait>)
        .collect();
    (mocks, providers)
}

pub(super) fn code_args() -> Vec<String> {
    vec!["123456".to_string()]
}

pub(super) fn destinations() -> Vec<String> {
    vec![PHONE.to_string()]
}
