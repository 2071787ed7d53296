//! Shared error types

use thiserror::Error;

/// Errors raised while loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A configuration source could not be read or deserialized
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    /// A value is present but violates a constraint
    #[error("Invalid configuration for `{field}`: {reason}")]
    Invalid { field: String, reason: String },

    /// The logging subscriber could not be installed
    #[error("Failed to initialize logging: {0}")]
    Logging(String),
}

impl ConfigError {
    /// Shorthand for [`ConfigError::Invalid`]
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
