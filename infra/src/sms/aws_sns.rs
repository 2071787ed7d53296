//! AWS SNS provider
//!
//! Usually the second provider behind Twilio. Messages go out through SNS
//! `Publish` directly to a phone number with the SMS type attribute set.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_sns::{config::Region, types::MessageAttributeValue, Client as SnsClient};
use std::collections::HashMap;
use tracing::{debug, info};

use vk_core::errors::DispatchError;
use vk_core::services::SmsServiceTrait;
use vk_shared::{phone::mask_phone_number, SmsConfig};

use super::delivery::{env_or, AttemptError, RetryPolicy};
use super::e164::to_e164;
use super::template::SmsTemplates;
use crate::InfrastructureError;

const PROVIDER_NAME: &str = "aws-sns";
const DEFAULT_REGION: &str = "us-east-1";
const SMS_TYPES: [&str; 2] = ["Transactional", "Promotional"];

#[derive(Debug, Clone)]
pub struct AwsSnsConfig {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub region: String,
    /// Not honored in every region
    pub sender_id: Option<String>,
    /// `Transactional` or `Promotional`
    pub sms_type: String,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub request_timeout_secs: u64,
}

/// First variable that is set among `names`
fn first_var(names: &[&str]) -> Option<String> {
    names.iter().find_map(|name| std::env::var(name).ok())
}

impl AwsSnsConfig {
    /// Standard `AWS_*` variables win over the `AWS_SNS_*` ones
    pub fn from_env(sms: &SmsConfig) -> Result<Self, InfrastructureError> {
        let access_key_id = first_var(&["AWS_ACCESS_KEY_ID", "AWS_SNS_ACCESS_KEY_ID"]).ok_or_else(
            || InfrastructureError::Config("AWS_ACCESS_KEY_ID or AWS_SNS_ACCESS_KEY_ID not set".into()),
        )?;
        let secret_access_key =
            first_var(&["AWS_SECRET_ACCESS_KEY", "AWS_SNS_SECRET_ACCESS_KEY"]).ok_or_else(|| {
                InfrastructureError::Config(
                    "AWS_SECRET_ACCESS_KEY or AWS_SNS_SECRET_ACCESS_KEY not set".into(),
                )
            })?;

        let sms_type = first_var(&["AWS_SNS_SMS_TYPE"]).unwrap_or_else(|| SMS_TYPES[0].to_string());
        if !SMS_TYPES.contains(&sms_type.as_str()) {
            return Err(InfrastructureError::Config(
                "AWS_SNS_SMS_TYPE must be either 'Transactional' or 'Promotional'".to_string(),
            ));
        }

        Ok(Self {
            access_key_id,
            secret_access_key,
            region: first_var(&["AWS_REGION", "AWS_SNS_REGION"])
                .unwrap_or_else(|| DEFAULT_REGION.to_string()),
            sender_id: first_var(&["AWS_SNS_SENDER_ID"]),
            sms_type,
            max_retries: env_or("AWS_SNS_MAX_RETRIES", sms.max_retries),
            retry_delay_ms: env_or("AWS_SNS_RETRY_DELAY_MS", sms.retry_delay_ms),
            request_timeout_secs: env_or("AWS_SNS_REQUEST_TIMEOUT_SECS", sms.request_timeout_secs),
        })
    }

    /// Publish attributes sent with every message
    fn message_attributes(&self) -> Result<HashMap<String, MessageAttributeValue>, InfrastructureError> {
        let mut attributes = HashMap::from([(
            "AWS.SNS.SMS.SMSType".to_string(),
            string_attribute(&self.sms_type)?,
        )]);
        if let Some(sender_id) = &self.sender_id {
            attributes.insert("AWS.SNS.SMS.SenderID".to_string(), string_attribute(sender_id)?);
        }
        Ok(attributes)
    }
}

fn string_attribute(value: &str) -> Result<MessageAttributeValue, InfrastructureError> {
    MessageAttributeValue::builder()
        .data_type("String")
        .string_value(value)
        .build()
        .map_err(|e| InfrastructureError::Config(format!("invalid SNS attribute: {}", e)))
}

pub struct AwsSnsSmsService {
    client: SnsClient,
    config: AwsSnsConfig,
    attributes: HashMap<String, MessageAttributeValue>,
    policy: RetryPolicy,
    templates: SmsTemplates,
}

impl AwsSnsSmsService {
    /// Build the SNS client with static credentials from `config`
    pub async fn new(
        config: AwsSnsConfig,
        templates: SmsTemplates,
    ) -> Result<Self, InfrastructureError> {
        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "verifykit",
        );
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials)
            .load()
            .await;

        info!(
            provider = PROVIDER_NAME,
            region = %config.region,
            sender_id = config.sender_id.as_deref().unwrap_or("-"),
            sms_type = %config.sms_type,
            "SMS provider ready"
        );

        Ok(Self {
            client: SnsClient::new(&sdk_config),
            attributes: config.message_attributes()?,
            policy: RetryPolicy::new(
                config.max_retries,
                config.retry_delay_ms,
                config.request_timeout_secs,
            ),
            config,
            templates,
        })
    }

    pub async fn from_env(sms: &SmsConfig) -> Result<Self, InfrastructureError> {
        let config = AwsSnsConfig::from_env(sms)?;
        Self::new(config, SmsTemplates::from_config(sms)).await
    }

    pub fn config(&self) -> &AwsSnsConfig {
        &self.config
    }

    async fn publish(&self, to: &str, body: &str) -> Result<String, AttemptError> {
        self.client
            .publish()
            .phone_number(to)
            .message(body)
            .set_message_attributes(Some(self.attributes.clone()))
            .send()
            .await
            .map(|output| output.message_id().unwrap_or_default().to_string())
            .map_err(|e| classify(e.to_string()))
    }
}

/// SNS validation failures; retrying cannot fix them
fn is_client_error(message: &str) -> bool {
    ["InvalidParameter", "InvalidPhoneNumber", "ValidationError"]
        .iter()
        .any(|code| message.contains(code))
}

fn classify(message: String) -> AttemptError {
    if is_client_error(&message) {
        AttemptError::Rejected(message)
    } else {
        AttemptError::Transient(message)
    }
}

#[async_trait]
impl SmsServiceTrait for AwsSnsSmsService {
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
            let message_id = self
                .policy
                .run(PROVIDER_NAME, &to, || self.publish(&to, &body))
                .await?;

            debug!(
                provider = PROVIDER_NAME,
                to = %mask_phone_number(&to),
                message_id = %message_id,
                "SMS accepted"
            );
        }

        Ok(())
    }

    fn provider_name(&self) -> &str {
        PROVIDER_NAME
    }
}
