//! Errors surfaced by the verification workflow.

mod types;


pub use types::{DispatchError, StoreError};

use thiserror::Error;

/// Error returned by [`VerificationService`](crate::services::VerificationService)
///
/// Expected outcomes such as cooldown or a wrong code are not errors, and a
/// failed delivery is reported as `SendOutcome::DispatchFailed`. Only
/// rejected input and store failures end up here.
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl DomainError {
    pub fn validation(message: impl Into<String>) -> Self {
        DomainError::Validation {
            message: message.into(),
        }
    }
}

pub type DomainResult<T> = Result<T, DomainError>;
