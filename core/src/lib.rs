//! # VerifyKit Core
//!
//! Core business logic and domain layer for VerifyKit.
//! This crate contains the verification code domain types, the error taxonomy
//! shared by every layer, the collaborator traits implemented by the
//! infrastructure crate, and the code issuance/verification service.

pub mod domain;
pub mod errors;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::*;
pub use errors::*;
pub use services::*;
