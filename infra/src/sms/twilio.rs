//! Twilio provider
//!
//! Each destination is sent as its own message. Destinations are normalized
//! to E.164 before any network call; the whole retry sequence for one
//! destination runs under the configured deadline.

use async_trait::async_trait;
use tracing::{debug, info};
use twilio::{Client, OutboundMessage};

use vk_core::errors::DispatchError;
use vk_core::services::SmsServiceTrait;
use vk_shared::phone::{is_e164, mask_phone_number};
use vk_shared::SmsConfig;

use super::delivery::{env_or, AttemptError, RetryPolicy};
use super::e164::to_e164;
use super::template::SmsTemplates;
use crate::InfrastructureError;

const PROVIDER_NAME: &str = "twilio";

#[derive(Debug, Clone)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: String,
    /// Sender; must be a number owned by the Twilio account
    pub from_number: String,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub request_timeout_secs: u64,
}

impl TwilioConfig {
    /// Credentials from `TWILIO_*`; retry and deadline settings default to
    /// `sms` unless overridden per provider
    pub fn from_env(sms: &SmsConfig) -> Result<Self, InfrastructureError> {
        let required = |name: &str| {
            std::env::var(name)
                .map_err(|_| InfrastructureError::Config(format!("{} not set", name)))
        };

        let from_number = required("TWILIO_FROM_NUMBER")?;
        if !is_e164(&from_number) {
            return Err(InfrastructureError::Config(
                "TWILIO_FROM_NUMBER must be in E.164 format".to_string(),
            ));
        }

        Ok(Self {
            account_sid: required("TWILIO_ACCOUNT_SID")?,
            auth_token: required("TWILIO_AUTH_TOKEN")?,
            from_number,
            max_retries: env_or("TWILIO_MAX_RETRIES", sms.max_retries),
            retry_delay_ms: env_or("TWILIO_RETRY_DELAY_MS", sms.retry_delay_ms),
            request_timeout_secs: env_or("TWILIO_REQUEST_TIMEOUT_SECS", sms.request_timeout_secs),
        })
    }

    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_retries,
            self.retry_delay_ms,
            self.request_timeout_secs,
        )
    }
}

pub struct TwilioSmsService {
    client: Client,
    config: TwilioConfig,
    policy: RetryPolicy,
    templates: SmsTemplates,
}

impl TwilioSmsService {
    pub fn new(config: TwilioConfig, templates: SmsTemplates) -> Self {
        info!(
            provider = PROVIDER_NAME,
            from = %mask_phone_number(&config.from_number),
            "SMS provider ready"
        );

        Self {
            client: Client::new(&config.account_sid, &config.auth_token),
            policy: config.retry_policy(),
            config,
            templates,
        }
    }

    pub fn from_env(sms: &SmsConfig) -> Result<Self, InfrastructureError> {
        let config = TwilioConfig::from_env(sms)?;
        Ok(Self::new(config, SmsTemplates::from_config(sms)))
    }

    pub fn config(&self) -> &TwilioConfig {
        &self.config
    }

    async fn send_one(&self, to: &str, body: &str) -> Result<String, AttemptError> {
        let outbound = OutboundMessage::new(&self.config.from_number, to, body);
        match self.client.send_message(outbound).await {
            Ok(sent) => Ok(sent.sid),
            Err(e) => Err(classify(e.to_string())),
        }
    }
}

/// 4xx other than 429 means the request itself is wrong
fn is_client_error(message: &str) -> bool {
    let lowered = message.to_lowercase();
    !lowered.contains("429") && (lowered.contains("400") || lowered.contains("invalid"))
}

fn classify(message: String) -> AttemptError {
    if is_client_error(&message) {
        AttemptError::Rejected(message)
    } else {
        AttemptError::Transient(message)
    }
}

#[async_trait]
impl SmsServiceTrait for TwilioSmsService {
    async fn send(
        &self,
        template_id: &str,
        args: &[String],
        destinations: &[String],
    ) -> Result<(), DispatchError> {
        if destinations.is_empty() {
            return Err(DispatchError::InvalidRequest("no destinations".to_string()));
        }
        let body = self.templates.render(template_id, args)?;

        for destination in destinations {
            let to = to_e164(destination)?;
            let sid = self
                .policy
                .run(PROVIDER_NAME, &to, || self.send_one(&to, &body))
                .await?;

            debug!(
                provider = PROVIDER_NAME,
                to = %mask_phone_number(&to),
                sid = %sid,
                chars = body.chars().count(),
                "SMS accepted"
            );
        }

        Ok(())
    }

    fn provider_name(&self) -> &str {
        PROVIDER_NAME
    }
}
