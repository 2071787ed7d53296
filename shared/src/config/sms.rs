//! SMS provider configuration module

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// SMS provider configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SmsConfig {
    /// Ordered provider names ("twilio", "aws-sns", "mock"); the first one
    /// starts out active
    #[serde(default = "default_providers")]
    pub providers: Vec<String>,

    /// Template bodies keyed by template id, with `{0}`, `{1}` placeholders
    #[serde(default = "default_templates")]
    pub templates: HashMap<String, String>,

    /// Attempts a provider makes internally before reporting failure
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Initial provider retry delay in milliseconds
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Per-request deadline in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for SmsConfig {
    fn default() -> Self {
        Self {
            providers: default_providers(),
            templates: default_templates(),
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_providers() -> Vec<String> {
    vec![String::from("mock")]
}

fn default_templates() -> HashMap<String, String> {
    HashMap::from([(
        String::from("verification_code"),
        String::from("Your verification code is {0}. Do not share it with anyone."),
    )])
}

fn default_max_retries() -> u32 {
    1
}

fn default_retry_delay_ms() -> u64 {
    200
}

fn default_request_timeout_secs() -> u64 {
    5
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SmsConfig::default();
        assert_eq!(config.providers, vec!["mock".to_string()]);
        assert!(config.templates.contains_key("verification_code"));
        assert_eq!(config.request_timeout_secs, 5);
    }
}
