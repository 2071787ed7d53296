//! Types for verification service results

use crate::errors::DispatchError;

/// Result of an issue-and-send request
#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    /// Code stored and handed to a provider
    Sent,
    /// A code was issued for this destination within the cooldown
    CooldownRejected,
    /// Code stored but delivery failed; it stays verifiable until superseded or expired
    DispatchFailed(DispatchError),
}

impl SendOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, SendOutcome::Sent)
    }
}

/// Result of verifying a submitted code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeCheck {
    Match,
    NoMatch,
}

impl CodeCheck {
    pub fn is_match(&self) -> bool {
        matches!(self, CodeCheck::Match)
    }
}
