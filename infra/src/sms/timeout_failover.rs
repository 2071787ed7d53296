//! Timeout-threshold failover SMS service
//!
//! Stays on one provider until it has timed out more than `threshold` times
//! in a row, then moves to the next one.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

use vk_core::errors::DispatchError;
use vk_core::services::SmsServiceTrait;

use crate::InfrastructureError;

/// SMS dispatcher rotating after consecutive provider timeouts
pub struct TimeoutFailoverSmsService {
    providers: Vec<Arc<dyn SmsServiceTrait>>,
    threshold: u32,
    active_index: AtomicUsize,
    consecutive_timeouts: AtomicU32,
}

impl TimeoutFailoverSmsService {
    pub fn new(
        providers: Vec<Arc<dyn SmsServiceTrait>>,
        threshold: u32,
    ) -> Result<Self, InfrastructureError> {
        if providers.is_empty() {
            return Err(InfrastructureError::Config(
                "timeout failover needs at least one provider".to_string(),
            ));
        }
        Ok(Self {
            providers,
            threshold,
            active_index: AtomicUsize::new(0),
            consecutive_timeouts: AtomicU32::new(0),
        })
    }

    pub fn active_index(&self) -> usize {
        self.active_index.load(Ordering::SeqCst)
    }

    pub fn consecutive_timeouts(&self) -> u32 {
        self.consecutive_timeouts.load(Ordering::SeqCst)
    }

    /// Rotate once the streak exceeds the threshold; only the caller that
    /// resets the streak performs the rotation
    fn rotate_if_exhausted(&self) {
        let timeouts = self.consecutive_timeouts.load(Ordering::SeqCst);
        if timeouts <= self.threshold {
            return;
        }
        if self
            .consecutive_timeouts
            .compare_exchange(timeouts, 0, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return;
        }

        let count = self.providers.len();
        let previous = self
            .active_index
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |i| Some((i + 1) % count))
            .unwrap_or_else(|i| i);
        info!(
            from = self.providers[previous].provider_name(),
            to = self.providers[(previous + 1) % count].provider_name(),
            timeouts = timeouts,
            event = "provider_rotated",
            "Rotated SMS provider after consecutive timeouts"
        );
    }
}

#[async_trait]
impl SmsServiceTrait for TimeoutFailoverSmsService {
    async fn send(
        &self,
        template_id: &str,
        args: &[String],
        destinations: &[String],
    ) -> Result<(), DispatchError> {
        self.rotate_if_exhausted();

        let provider = &self.providers[self.active_index() % self.providers.len()];
        match provider.send(template_id, args, destinations).await {
            Ok(()) => {
                self.consecutive_timeouts.store(0, Ordering::SeqCst);
                Ok(())
            }
            Err(e) if e.is_timeout() => {
                let streak = self.consecutive_timeouts.fetch_add(1, Ordering::SeqCst) + 1;
                warn!(
                    provider = provider.provider_name(),
                    consecutive_timeouts = streak,
                    threshold = self.threshold,
                    "SMS provider timed out"
                );
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    fn provider_name(&self) -> &str {
        "timeout_failover"
    }
}
