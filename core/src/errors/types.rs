//! Error types for the shared store and for message dispatch

use thiserror::Error;

/// Failures of the shared store (verification records and rate windows)
///
/// Cooldown, mismatch and exhaustion are outcomes, not errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Unexpected reply {code} from script {script}")]
    UnexpectedReply { script: String, code: i64 },

    #[error("Invalid key: {0}")]
    InvalidKey(String),
}

/// Failures of a logical send through a provider or a dispatcher
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("Rate limit exceeded for {key}")]
    RateLimited { key: String },

    #[error("Provider {provider} failed: {message}")]
    Provider { provider: String, message: String },

    #[error("Provider {provider} timed out")]
    Timeout { provider: String },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("All {attempted} providers failed")]
    AllProvidersFailed { attempted: usize },

    #[error("Rate limiter unavailable: {0}")]
    Limiter(#[from] StoreError),
}

impl DispatchError {
    /// Build a provider failure
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        DispatchError::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Whether retrying the same request later may succeed
    ///
    /// Invalid requests never succeed on retry.
    pub fn is_transient(&self) -> bool {
        !matches!(self, DispatchError::InvalidRequest(_))
    }

    /// Whether this is a provider deadline overrun
    pub fn is_timeout(&self) -> bool {
        matches!(self, DispatchError::Timeout { .. })
    }
}
