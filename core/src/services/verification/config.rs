//! Configuration for the verification service

use vk_shared::VerificationConfig;

/// Configuration for the verification service
#[derive(Debug, Clone)]
pub struct VerificationServiceConfig {
    /// Provider template used to deliver codes; receives the code as `{0}`
    pub template_id: String,
}

impl Default for VerificationServiceConfig {
    fn default() -> Self {
        Self::from(&VerificationConfig::default())
    }
}

impl From<&VerificationConfig> for VerificationServiceConfig {
    fn from(config: &VerificationConfig) -> Self {
        Self {
            template_id: config.template_id.clone(),
        }
    }
}
