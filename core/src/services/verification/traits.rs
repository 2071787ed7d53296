//! Traits for message dispatch, code cache and rate limiter integration

use async_trait::async_trait;

use crate::domain::entities::verification_code::{IssueOutcome, VerifyOutcome};
use crate::errors::{DispatchError, StoreError};

/// Trait for message providers and dispatchers
#[async_trait]
pub trait SmsServiceTrait: Send + Sync {
    /// Render `template_id` with positional `args` and deliver it to every destination
    async fn send(
        &self,
        template_id: &str,
        args: &[String],
        destinations: &[String],
    ) -> Result<(), DispatchError>;

    /// Provider name, used in logs and rate limit keys
    fn provider_name(&self) -> &str;
}

/// Trait for the verification code store
///
/// Both operations must be atomic per `(scope, destination)` across every
/// process sharing the store.
#[async_trait]
pub trait CodeCacheTrait: Send + Sync {
    /// Write a fresh record unless one younger than the cooldown exists
    async fn issue(
        &self,
        scope: &str,
        destination: &str,
        code: &str,
    ) -> Result<IssueOutcome, StoreError>;

    /// Check a candidate code and consume one attempt on mismatch
    async fn verify(
        &self,
        scope: &str,
        destination: &str,
        candidate: &str,
    ) -> Result<VerifyOutcome, StoreError>;
}

/// Trait for sliding window admission control
#[async_trait]
pub trait RateLimiterTrait: Send + Sync {
    /// Returns `true` when the request must be rejected; admitted requests are recorded
    async fn limit(&self, key: &str) -> Result<bool, StoreError>;
}
