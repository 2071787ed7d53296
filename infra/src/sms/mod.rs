//! SMS Service Module
//!
//! Providers and dispatchers delivering verification codes.
//!
//! ## Features
//!
//! - **Templates**: `{n}` placeholder rendering shared by every provider
//! - **Mock Implementation**: records messages, injectable failures and latency
//! - **Twilio Support**: production SMS via the Twilio API
//! - **AWS SNS Support**: alternative production provider
//! - **Dispatchers**: adaptive, round-robin and timeout failover over an
//!   ordered provider list, plus a rate-limiting decorator
//! - **Security**: phone number masking in logs

use std::sync::Arc;

use vk_core::services::{RateLimiterTrait, SmsServiceTrait};
use vk_shared::{AppConfig, DispatchStrategy, SmsConfig};

use crate::InfrastructureError;

pub mod adaptive_failover;
#[cfg(any(feature = "twilio-sms", feature = "aws-sns"))]
mod delivery;
pub mod e164;
pub mod mock_sms;
pub mod rate_limited;
pub mod round_robin;
pub mod template;
pub mod timeout_failover;

// Twilio SMS service (feature-gated)
#[cfg(feature = "twilio-sms")]
pub mod twilio;

// AWS SNS SMS service (feature-gated)
#[cfg(feature = "aws-sns")]
pub mod aws_sns;

pub use adaptive_failover::AdaptiveFailoverSmsService;
pub use e164::to_e164;
pub use mock_sms::{MockSmsService, SentSms};
pub use rate_limited::{RateLimitScope, RateLimitedSmsService};
pub use round_robin::RoundRobinFailoverSmsService;
pub use template::{SmsTemplates, MAX_MESSAGE_LENGTH};
pub use timeout_failover::TimeoutFailoverSmsService;

#[cfg(feature = "twilio-sms")]
pub use twilio::{TwilioConfig, TwilioSmsService};

#[cfg(feature = "aws-sns")]
pub use aws_sns::{AwsSnsConfig, AwsSnsSmsService};

#[cfg(test)]
mod tests;

/// Create one SMS provider by name
///
/// Unknown names, and providers whose configuration is incomplete, fall
/// back to the mock implementation with a warning.
pub async fn create_sms_service(name: &str, sms: &SmsConfig) -> Arc<dyn SmsServiceTrait> {
    let built: Result<Arc<dyn SmsServiceTrait>, InfrastructureError> = match name {
        "mock" => Ok(Arc::new(MockSmsService::with_templates(
            "mock",
            SmsTemplates::from_config(sms),
        ))),
        #[cfg(feature = "twilio-sms")]
        "twilio" => TwilioSmsService::from_env(sms)
            .map(|service| Arc::new(service) as Arc<dyn SmsServiceTrait>),
        #[cfg(feature = "aws-sns")]
        "aws-sns" => AwsSnsSmsService::from_env(sms)
            .await
            .map(|service| Arc::new(service) as Arc<dyn SmsServiceTrait>),
        _ => Err(InfrastructureError::Config(format!(
            "unknown SMS provider '{}'",
            name
        ))),
    };

    built.unwrap_or_else(|e| {
        tracing::warn!(provider = name, error = %e, "SMS provider unavailable, using mock");
        Arc::new(MockSmsService::with_templates(
            "mock",
            SmsTemplates::from_config(sms),
        ))
    })
}

/// Build the dispatcher described by `config`
///
/// Providers are created in `sms.providers` order. When a per-destination
/// limiter is given it guards the dispatcher as a whole.
pub async fn create_dispatcher(
    config: &AppConfig,
    dispatch_limiter: Arc<dyn RateLimiterTrait>,
    destination_limiter: Option<Arc<dyn RateLimiterTrait>>,
) -> Result<Arc<dyn SmsServiceTrait>, InfrastructureError> {
    let mut providers = Vec::with_capacity(config.sms.providers.len());
    for name in &config.sms.providers {
        providers.push(create_sms_service(name, &config.sms).await);
    }

    let dispatch = &config.dispatch;
    let dispatcher: Arc<dyn SmsServiceTrait> = match dispatch.strategy {
        DispatchStrategy::Adaptive => Arc::new(AdaptiveFailoverSmsService::new(
            providers,
            dispatch_limiter,
            dispatch,
        )?),
        DispatchStrategy::RoundRobin => Arc::new(RateLimitedSmsService::new(
            Arc::new(RoundRobinFailoverSmsService::new(providers)?),
            dispatch_limiter,
            RateLimitScope::Provider,
        )),
        DispatchStrategy::Timeout => Arc::new(RateLimitedSmsService::new(
            Arc::new(TimeoutFailoverSmsService::new(
                providers,
                dispatch.timeout_threshold,
            )?),
            dispatch_limiter,
            RateLimitScope::Provider,
        )),
    };

    tracing::info!(
        strategy = ?dispatch.strategy,
        providers = ?config.sms.providers,
        per_destination_limit = destination_limiter.is_some(),
        "SMS dispatcher created"
    );

    Ok(match destination_limiter {
        Some(limiter) => Arc::new(RateLimitedSmsService::new(
            dispatcher,
            limiter,
            RateLimitScope::Destination,
        )),
        None => dispatcher,
    })
}
