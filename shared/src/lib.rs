//! Shared utilities and common types for VerifyKit
//!
//! This crate provides functionality used across all workspace crates:
//! - Configuration types and layered loading
//! - Logging bootstrap
//! - Configuration error types
//! - Phone number helpers (normalization, masking for logs)

pub mod config;
pub mod errors;
pub mod utils;

// Re-export commonly used items at crate root
pub use config::{
    AppConfig, CacheConfig, CacheType, DispatchConfig, DispatchStrategy, Environment,
    LogFormat, LoggingConfig, RateLimitConfig, RateWindowConfig, SmsConfig,
    VerificationConfig,
};
pub use errors::ConfigError;
pub use utils::phone;
