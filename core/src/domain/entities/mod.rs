//! Domain entities representing core business objects.

pub mod verification_code;


// Re-export commonly used types
pub use verification_code::{
    generate_code, is_well_formed_code, CodeKey, CodePolicy, IssueOutcome, VerifyOutcome,
    CODE_LENGTH, DEFAULT_COOLDOWN_SECONDS, DEFAULT_RECORD_TTL_SECONDS, MAX_ATTEMPTS,
};
