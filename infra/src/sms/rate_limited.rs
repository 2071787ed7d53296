//! Rate-limited SMS service decorator

use async_trait::async_trait;
use std::sync::Arc;
use tracing::warn;

use vk_core::errors::DispatchError;
use vk_core::services::{RateLimiterTrait, SmsServiceTrait};
use vk_shared::phone::mask_phone_number;

/// What a limiter key is derived from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitScope {
    /// One window per wrapped provider: `sms:{provider}`
    Provider,
    /// One window per destination: `sms:dest:{destination}`
    Destination,
}

/// Consults a limiter before delegating to the wrapped service
///
/// Keys are checked in destination order and each admitted check records a
/// slot. When a later destination is limited the send is rejected as a
/// whole, but the slots already taken by earlier destinations stay spent.
pub struct RateLimitedSmsService {
    inner: Arc<dyn SmsServiceTrait>,
    limiter: Arc<dyn RateLimiterTrait>,
    scope: RateLimitScope,
}

impl RateLimitedSmsService {
    pub fn new(
        inner: Arc<dyn SmsServiceTrait>,
        limiter: Arc<dyn RateLimiterTrait>,
        scope: RateLimitScope,
    ) -> Self {
        Self {
            inner,
            limiter,
            scope,
        }
    }

    fn keys(&self, destinations: &[String]) -> Vec<String> {
        match self.scope {
            RateLimitScope::Provider => vec![format!("sms:{}", self.inner.provider_name())],
            RateLimitScope::Destination => destinations
                .iter()
                .map(|d| format!("sms:dest:{}", d))
                .collect(),
        }
    }
}

#[async_trait]
impl SmsServiceTrait for RateLimitedSmsService {
    async fn send(
        &self,
        template_id: &str,
        args: &[String],
        destinations: &[String],
    ) -> Result<(), DispatchError> {
        for key in self.keys(destinations) {
            if self.limiter.limit(&key).await? {
                warn!(
                    key = %mask_phone_number(&key),
                    provider = self.inner.provider_name(),
                    event = "sms_rate_limited",
                    "SMS rate limit reached"
                );
                return Err(DispatchError::RateLimited { key });
            }
        }

        self.inner.send(template_id, args, destinations).await
    }

    fn provider_name(&self) -> &str {
        self.inner.provider_name()
    }
}
