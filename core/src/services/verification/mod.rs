//! Verification service module for phone-based login codes
//!
//! This module provides the verification code workflow:
//! - Code generation and atomic admission against the cooldown
//! - Delivery through a message dispatcher
//! - Code verification with a bounded attempt budget
//! - Collaborator traits implemented by the infrastructure layer

mod config;
mod service;
mod traits;
mod types;

#[cfg(test)]
mod tests;

pub use config::VerificationServiceConfig;
pub use service::VerificationService;
pub use traits::{CodeCacheTrait, RateLimiterTrait, SmsServiceTrait};
pub use types::{CodeCheck, SendOutcome};
