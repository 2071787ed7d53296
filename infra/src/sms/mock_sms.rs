//! Mock SMS Service Implementation
//!
//! A provider that records messages instead of sending them. Failures and
//! latency can be injected at runtime, which is what the dispatcher tests
//! and local development rely on.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};
use uuid::Uuid;

use vk_core::errors::DispatchError;
use vk_core::services::SmsServiceTrait;
use vk_shared::phone::mask_phone_number;

use super::template::SmsTemplates;

/// A message accepted by the mock provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentSms {
    pub message_id: String,
    pub destination: String,
    pub template_id: String,
    pub args: Vec<String>,
    pub body: String,
}

/// Mock SMS service for development and testing
///
/// Clones share recorded messages and injected behavior.
#[derive(Clone)]
pub struct MockSmsService {
    name: String,
    templates: SmsTemplates,
    /// Counter for tracking number of messages sent
    message_count: Arc<AtomicU64>,
    /// Send calls, successful or not
    call_count: Arc<AtomicU64>,
    messages: Arc<Mutex<Vec<SentSms>>>,
    /// Error returned by every send while set
    failure: Arc<RwLock<Option<DispatchError>>>,
    /// Artificial delay before each send completes
    latency_ms: Arc<AtomicU64>,
}

impl MockSmsService {
    /// Create a new mock SMS service named "mock" with default templates
    pub fn new() -> Self {
        Self::named("mock")
    }

    /// Create a mock service with a custom provider name
    pub fn named(name: impl Into<String>) -> Self {
        Self::with_templates(name, SmsTemplates::from_config(&Default::default()))
    }

    pub fn with_templates(name: impl Into<String>, templates: SmsTemplates) -> Self {
        Self {
            name: name.into(),
            templates,
            message_count: Arc::new(AtomicU64::new(0)),
            call_count: Arc::new(AtomicU64::new(0)),
            messages: Arc::new(Mutex::new(Vec::new())),
            failure: Arc::new(RwLock::new(None)),
            latency_ms: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Get the total number of messages sent
    pub fn get_message_count(&self) -> u64 {
        self.message_count.load(Ordering::SeqCst)
    }

    /// Number of send calls, failed ones included
    pub fn get_call_count(&self) -> u64 {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Reset counters and recorded messages
    pub async fn reset(&self) {
        self.message_count.store(0, Ordering::SeqCst);
        self.call_count.store(0, Ordering::SeqCst);
        self.messages.lock().await.clear();
    }

    /// Make every following send fail with `error`, or succeed again with `None`
    pub async fn set_failure(&self, error: Option<DispatchError>) {
        *self.failure.write().await = error;
    }

    /// Delay every following send by `latency`
    pub fn set_latency(&self, latency: Duration) {
        self.latency_ms
            .store(latency.as_millis() as u64, Ordering::SeqCst);
    }

    /// Messages accepted so far, oldest first
    pub async fn sent_messages(&self) -> Vec<SentSms> {
        self.messages.lock().await.clone()
    }

    /// Last code-bearing argument sent to `destination`
    pub async fn last_code_for(&self, destination: &str) -> Option<String> {
        self.messages
            .lock()
            .await
            .iter()
            .rev()
            .find(|m| m.destination == destination)
            .and_then(|m| m.args.first().cloned())
    }
}

impl Default for MockSmsService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SmsServiceTrait for MockSmsService {
    async fn send(
        &self,
        template_id: &str,
        args: &[String],
        destinations: &[String],
    ) -> Result<(), DispatchError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);

        if destinations.is_empty() {
            return Err(DispatchError::InvalidRequest("no destinations".to_string()));
        }
        if destinations.iter().any(|d| d.trim().is_empty()) {
            return Err(DispatchError::InvalidRequest("empty destination".to_string()));
        }
        let body = self.templates.render(template_id, args)?;

        let latency = self.latency_ms.load(Ordering::SeqCst);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }

        if let Some(error) = self.failure.read().await.clone() {
            warn!(
                provider = %self.name,
                error = %error,
                "Mock SMS service simulating failure"
            );
            return Err(error);
        }

        let mut messages = self.messages.lock().await;
        for destination in destinations {
            let message_id = format!("mock_{}", Uuid::new_v4());
            self.message_count.fetch_add(1, Ordering::SeqCst);

            info!(
                target: "sms_service",
                provider = %self.name,
                phone = %mask_phone_number(destination),
                message_id = %message_id,
                message_length = body.len(),
                "SMS sent successfully (mock)"
            );

            messages.push(SentSms {
                message_id,
                destination: destination.clone(),
                template_id: template_id.to_string(),
                args: args.to_vec(),
                body: body.clone(),
            });
        }

        Ok(())
    }

    fn provider_name(&self) -> &str {
        &self.name
    }
}
