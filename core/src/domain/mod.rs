//! Domain layer containing verification code entities and outcomes.

pub mod entities;

// Re-export commonly used domain types
pub use entities::*;
