//! Adaptive Failover SMS Service
//!
//! Routes every logical send to one active provider out of an ordered list
//! and moves on to the next provider when:
//! - the shared dispatch limiter rejects the request
//! - the active provider returns an error
//! - a successful send is much slower than the provider's baseline, or
//!   slower than the absolute latency ceiling
//!
//! Rotation state lives in two atomics updated with compare-and-swap, so
//! concurrent callers never block each other. Concurrent callers may briefly
//! use different providers; rotation is advisory.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use vk_core::errors::DispatchError;
use vk_core::services::{RateLimiterTrait, SmsServiceTrait};
use vk_shared::DispatchConfig;

use crate::InfrastructureError;

/// Reason recorded with a rotation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RotationReason {
    RateLimited,
    ProviderError,
    LatencyDegraded,
}

/// SMS dispatcher rotating across providers on pressure, failure and slowness
pub struct AdaptiveFailoverSmsService {
    providers: Vec<Arc<dyn SmsServiceTrait>>,
    limiter: Arc<dyn RateLimiterTrait>,
    limiter_key: String,
    degradation_rate: f64,
    latency_ceiling: Duration,
    retry_window: Duration,
    retry_count: u32,
    /// Index of the provider new sends go to
    active_index: AtomicUsize,
    /// Latency of the first successful send after the last rotation, in µs; 0 = unset
    baseline_latency_us: AtomicU64,
}

impl AdaptiveFailoverSmsService {
    /// Create a dispatcher over `providers`, first one active
    ///
    /// # Errors
    ///
    /// Fails when `providers` is empty or the degradation rate is not positive.
    pub fn new(
        providers: Vec<Arc<dyn SmsServiceTrait>>,
        limiter: Arc<dyn RateLimiterTrait>,
        config: &DispatchConfig,
    ) -> Result<Self, InfrastructureError> {
        if providers.is_empty() {
            return Err(InfrastructureError::Config(
                "adaptive failover needs at least one provider".to_string(),
            ));
        }
        if config.degradation_rate.is_nan() || config.degradation_rate <= 0.0 {
            return Err(InfrastructureError::Config(format!(
                "degradation rate must be positive, got {}",
                config.degradation_rate
            )));
        }

        info!(
            providers = ?providers.iter().map(|p| p.provider_name()).collect::<Vec<_>>(),
            degradation_rate = config.degradation_rate,
            latency_ceiling_ms = config.latency_ceiling_ms,
            "Initializing adaptive failover SMS service"
        );

        Ok(Self {
            providers,
            limiter,
            limiter_key: config.limiter_key.clone(),
            degradation_rate: config.degradation_rate,
            latency_ceiling: config.latency_ceiling(),
            retry_window: config.retry_window(),
            retry_count: config.retry_count,
            active_index: AtomicUsize::new(0),
            baseline_latency_us: AtomicU64::new(0),
        })
    }

    /// Index of the currently active provider
    pub fn active_index(&self) -> usize {
        self.active_index.load(Ordering::SeqCst)
    }

    /// Name of the currently active provider
    pub fn active_provider(&self) -> &str {
        self.providers[self.active_index() % self.providers.len()].provider_name()
    }

    /// Baseline latency of the active provider, if one has been measured
    pub fn baseline_latency(&self) -> Option<Duration> {
        match self.baseline_latency_us.load(Ordering::SeqCst) {
            0 => None,
            us => Some(Duration::from_micros(us)),
        }
    }

    pub fn provider_count(&self) -> usize {
        self.providers.len()
    }

    /// Window within which callers may retry a failed send
    pub fn retry_window(&self) -> Duration {
        self.retry_window
    }

    /// Attempts callers may make within the retry window
    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    /// Move to the provider after `observed`, unless another caller already moved on
    fn rotate_from(&self, observed: usize, reason: RotationReason) -> bool {
        let next = (observed + 1) % self.providers.len();
        match self
            .active_index
            .compare_exchange(observed, next, Ordering::SeqCst, Ordering::SeqCst)
        {
            Ok(_) => {
                self.baseline_latency_us.store(0, Ordering::SeqCst);
                info!(
                    from = self.providers[observed].provider_name(),
                    to = self.providers[next].provider_name(),
                    reason = ?reason,
                    event = "provider_rotated",
                    "Rotated active SMS provider"
                );
                true
            }
            Err(current) => {
                debug!(
                    observed = observed,
                    current = current,
                    reason = ?reason,
                    "Rotation already performed by another caller"
                );
                false
            }
        }
    }

    /// Track latency of a successful send and rotate when it degraded
    ///
    /// Sends that finish after their provider was rotated out say nothing
    /// about the new active provider and are ignored.
    fn observe_latency(&self, observed: usize, elapsed: Duration) {
        if self.active_index.load(Ordering::SeqCst) % self.providers.len() != observed {
            debug!(
                provider = self.providers[observed].provider_name(),
                elapsed_ms = elapsed.as_millis() as u64,
                "Ignoring latency of a send to an inactive provider"
            );
            return;
        }

        let elapsed_us = (elapsed.as_micros() as u64).max(1);
        let baseline_us = self.baseline_latency_us.load(Ordering::SeqCst);

        if baseline_us == 0 {
            if self
                .baseline_latency_us
                .compare_exchange(0, elapsed_us, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
            {
                debug!(
                    provider = self.providers[observed].provider_name(),
                    baseline_us = elapsed_us,
                    "Installed latency baseline"
                );
            }
            return;
        }

        let ratio = elapsed_us as f64 / baseline_us as f64;
        if elapsed > self.latency_ceiling || ratio > self.degradation_rate {
            warn!(
                provider = self.providers[observed].provider_name(),
                elapsed_ms = elapsed.as_millis() as u64,
                baseline_us = baseline_us,
                ratio = ratio,
                event = "latency_degraded",
                "SMS provider latency degraded"
            );
            self.rotate_from(observed, RotationReason::LatencyDegraded);
        }
    }
}

#[async_trait]
impl SmsServiceTrait for AdaptiveFailoverSmsService {
    async fn send(
        &self,
        template_id: &str,
        args: &[String],
        destinations: &[String],
    ) -> Result<(), DispatchError> {
        let observed = self.active_index.load(Ordering::SeqCst) % self.providers.len();

        let limited = self.limiter.limit(&self.limiter_key).await.map_err(|e| {
            error!(
                key = %self.limiter_key,
                error = %e,
                "Dispatch limiter unavailable"
            );
            DispatchError::Limiter(e)
        })?;

        if limited {
            warn!(
                key = %self.limiter_key,
                provider = self.providers[observed].provider_name(),
                event = "dispatch_rate_limited",
                "Dispatch rate limit reached"
            );
            self.rotate_from(observed, RotationReason::RateLimited);
            return Err(DispatchError::RateLimited {
                key: self.limiter_key.clone(),
            });
        }

        let provider = &self.providers[observed];
        let started = Instant::now();

        match provider.send(template_id, args, destinations).await {
            Ok(()) => {
                let elapsed = started.elapsed();
                debug!(
                    provider = provider.provider_name(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    "SMS provider send succeeded"
                );
                self.observe_latency(observed, elapsed);
                Ok(())
            }
            Err(e) => {
                warn!(
                    provider = provider.provider_name(),
                    error = %e,
                    event = "provider_failed",
                    "SMS provider send failed"
                );
                self.rotate_from(observed, RotationReason::ProviderError);
                Err(e)
            }
        }
    }

    fn provider_name(&self) -> &str {
        "adaptive_failover"
    }
}
