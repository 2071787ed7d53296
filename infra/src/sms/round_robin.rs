//! Round-robin failover SMS service
//!
//! Each send starts at the next provider in turn and falls through the list
//! until one provider accepts the message.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

use vk_core::errors::DispatchError;
use vk_core::services::SmsServiceTrait;

use crate::InfrastructureError;

/// SMS dispatcher spreading sends evenly and failing over within one send
pub struct RoundRobinFailoverSmsService {
    providers: Vec<Arc<dyn SmsServiceTrait>>,
    next: AtomicUsize,
}

impl RoundRobinFailoverSmsService {
    pub fn new(providers: Vec<Arc<dyn SmsServiceTrait>>) -> Result<Self, InfrastructureError> {
        if providers.is_empty() {
            return Err(InfrastructureError::Config(
                "round-robin failover needs at least one provider".to_string(),
            ));
        }
        Ok(Self {
            providers,
            next: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl SmsServiceTrait for RoundRobinFailoverSmsService {
    async fn send(
        &self,
        template_id: &str,
        args: &[String],
        destinations: &[String],
    ) -> Result<(), DispatchError> {
        let count = self.providers.len();
        let start = self.next.fetch_add(1, Ordering::Relaxed) % count;

        for offset in 0..count {
            let provider = &self.providers[(start + offset) % count];
            match provider.send(template_id, args, destinations).await {
                Ok(()) => {
                    if offset > 0 {
                        info!(
                            provider = provider.provider_name(),
                            attempts = offset + 1,
                            "SMS delivered after failover"
                        );
                    }
                    return Ok(());
                }
                // No other provider can fix a malformed request
                Err(e @ DispatchError::InvalidRequest(_)) => return Err(e),
                Err(e) => {
                    warn!(
                        provider = provider.provider_name(),
                        error = %e,
                        "SMS provider failed, trying next"
                    );
                }
            }
        }

        Err(DispatchError::AllProvidersFailed { attempted: count })
    }

    fn provider_name(&self) -> &str {
        "round_robin_failover"
    }
}
