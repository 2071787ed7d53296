//! Verification code entity: keys, policy and store outcomes.

use rand::{rngs::OsRng, Rng};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use vk_shared::VerificationConfig;

use crate::errors::StoreError;

/// Maximum number of verification attempts allowed per issued code
pub const MAX_ATTEMPTS: u32 = 3;

/// Length of the verification code
pub const CODE_LENGTH: usize = 6;

/// Minimum seconds between two admitted issuances for the same key
pub const DEFAULT_COOLDOWN_SECONDS: u64 = 60;

/// Record lifetime in the store, ten cooldowns
pub const DEFAULT_RECORD_TTL_SECONDS: u64 = 600;

/// Generates a cryptographically secure random 6-digit code
///
/// Leading zeros are kept, so every value in `000000..=999999` is possible.
pub fn generate_code() -> String {
    let value: u32 = OsRng.gen_range(0..1_000_000);
    format!("{:0width$}", value, width = CODE_LENGTH)
}

/// Whether `candidate` has the shape of an issued code (exactly six ASCII digits)
pub fn is_well_formed_code(candidate: &str) -> bool {
    candidate.len() == CODE_LENGTH && candidate.bytes().all(|b| b.is_ascii_digit())
}

/// Identity of a verification record: a business scope plus a destination
///
/// The same destination may hold independent codes under different scopes
/// (e.g. "login" and "reset_password").
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CodeKey {
    scope: String,
    destination: String,
}

impl CodeKey {
    /// Build a key, rejecting empty components
    pub fn new(scope: &str, destination: &str) -> Result<Self, StoreError> {
        if scope.trim().is_empty() {
            return Err(StoreError::InvalidKey("scope must not be empty".to_string()));
        }
        if destination.trim().is_empty() {
            return Err(StoreError::InvalidKey(
                "destination must not be empty".to_string(),
            ));
        }
        Ok(Self {
            scope: scope.to_string(),
            destination: destination.to_string(),
        })
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    /// Store key, without any deployment prefix
    pub fn storage_key(&self) -> String {
        format!("verification:code:{}:{}", self.scope, self.destination)
    }
}

impl fmt::Display for CodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.scope, self.destination)
    }
}

/// Cooldown, attempt ceiling and lifetime applied by every code cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodePolicy {
    /// Minimum time between two admitted issuances
    pub cooldown: Duration,
    /// Attempts granted to each issued code
    pub max_attempts: u32,
    /// Store lifetime of a record
    pub record_ttl: Duration,
}

impl Default for CodePolicy {
    fn default() -> Self {
        Self {
            cooldown: Duration::from_secs(DEFAULT_COOLDOWN_SECONDS),
            max_attempts: MAX_ATTEMPTS,
            record_ttl: Duration::from_secs(DEFAULT_RECORD_TTL_SECONDS),
        }
    }
}

impl From<&VerificationConfig> for CodePolicy {
    fn from(config: &VerificationConfig) -> Self {
        Self {
            cooldown: config.cooldown(),
            max_attempts: config.max_attempts,
            record_ttl: config.record_ttl(),
        }
    }
}

impl CodePolicy {
    pub fn cooldown_ms(&self) -> u64 {
        self.cooldown.as_millis() as u64
    }

    pub fn record_ttl_ms(&self) -> u64 {
        self.record_ttl.as_millis() as u64
    }
}

/// Result of an issuance attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueOutcome {
    /// A fresh record was written
    Admitted,
    /// A record newer than the cooldown exists; nothing was written
    Cooldown,
}

/// Result of a verification attempt
///
/// "No record" deliberately reads as `Mismatch` so callers cannot probe
/// whether a code was ever issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerifyOutcome {
    /// Candidate matched; the record is gone
    Match,
    /// Candidate did not match, or no live record exists
    Mismatch,
    /// The attempt budget is spent; the record is gone
    AttemptsExhausted,
}

impl IssueOutcome {
    /// Decode the reply of the issue script
    pub fn from_reply(code: i64) -> Result<Self, StoreError> {
        match code {
            0 => Ok(IssueOutcome::Admitted),
            -1 => Ok(IssueOutcome::Cooldown),
            other => Err(StoreError::UnexpectedReply {
                script: "issue_code".to_string(),
                code: other,
            }),
        }
    }
}

impl VerifyOutcome {
    /// Decode the reply of the verify script
    pub fn from_reply(code: i64) -> Result<Self, StoreError> {
        match code {
            0 => Ok(VerifyOutcome::Match),
            -1 => Ok(VerifyOutcome::AttemptsExhausted),
            -2 => Ok(VerifyOutcome::Mismatch),
            other => Err(StoreError::UnexpectedReply {
                script: "verify_code".to_string(),
                code: other,
            }),
        }
    }
}
