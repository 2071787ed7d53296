//! Verification code configuration module

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Verification code record policy
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VerificationConfig {
    /// Minimum seconds between two issuances for the same scope and destination
    #[serde(default = "default_cooldown_seconds")]
    pub cooldown_seconds: u64,

    /// Verification attempts granted per issued code
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Store TTL of a record in seconds; must exceed the cooldown
    #[serde(default = "default_record_ttl_seconds")]
    pub record_ttl_seconds: u64,

    /// Provider template used to deliver codes
    #[serde(default = "default_template_id")]
    pub template_id: String,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            cooldown_seconds: default_cooldown_seconds(),
            max_attempts: default_max_attempts(),
            record_ttl_seconds: default_record_ttl_seconds(),
            template_id: default_template_id(),
        }
    }
}

impl VerificationConfig {
    /// Cooldown interval
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_seconds)
    }

    /// Record time-to-live
    pub fn record_ttl(&self) -> Duration {
        Duration::from_secs(self.record_ttl_seconds)
    }
}

fn default_cooldown_seconds() -> u64 {
    60
}

fn default_max_attempts() -> u32 {
    3
}

fn default_record_ttl_seconds() -> u64 {
    // Ten cooldown periods
    600
}

fn default_template_id() -> String {
    String::from("verification_code")
}
