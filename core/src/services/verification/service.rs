//! Main verification service implementation

use std::sync::Arc;

use vk_shared::phone::mask_phone_number;

use crate::domain::entities::verification_code::{
    generate_code, is_well_formed_code, IssueOutcome, VerifyOutcome,
};
use crate::errors::{DomainError, DomainResult};

use super::config::VerificationServiceConfig;
use super::traits::{CodeCacheTrait, SmsServiceTrait};
use super::types::{CodeCheck, SendOutcome};

/// Verification service orchestrating code issuance, delivery and checking
pub struct VerificationService<S: SmsServiceTrait + ?Sized, C: CodeCacheTrait + ?Sized> {
    /// Dispatcher or provider delivering codes
    sms_service: Arc<S>,
    /// Store holding one record per scope and destination
    code_cache: Arc<C>,
    /// Service configuration
    config: VerificationServiceConfig,
}

impl<S: SmsServiceTrait + ?Sized, C: CodeCacheTrait + ?Sized> VerificationService<S, C> {
    /// Create a new verification service
    ///
    /// # Arguments
    ///
    /// * `sms_service` - Dispatcher used to deliver codes
    /// * `code_cache` - Verification code store
    /// * `config` - Service configuration
    pub fn new(
        sms_service: Arc<S>,
        code_cache: Arc<C>,
        config: VerificationServiceConfig,
    ) -> Self {
        Self {
            sms_service,
            code_cache,
            config,
        }
    }

    /// Issue a fresh code for `destination` under `scope` and deliver it
    ///
    /// This method:
    /// 1. Validates the inputs
    /// 2. Generates a 6-digit code with the OS random source
    /// 3. Atomically admits it against the cooldown
    /// 4. Hands the code to the dispatcher
    ///
    /// A dispatch failure leaves the stored code in place: a send that timed
    /// out may still reach the handset.
    ///
    /// # Returns
    ///
    /// * `Ok(SendOutcome)` - Sent, rejected by cooldown, or failed delivery
    /// * `Err(DomainError)` - Invalid input or store failure
    pub async fn issue_and_send(&self, scope: &str, destination: &str) -> DomainResult<SendOutcome> {
        Self::validate_inputs(scope, destination)?;
        let masked = mask_phone_number(destination);

        let code = generate_code();

        let outcome = self
            .code_cache
            .issue(scope, destination, &code)
            .await
            .map_err(|e| {
                tracing::error!(
                    scope = scope,
                    destination = %masked,
                    error = %e,
                    event = "code_issue_failed",
                    "Failed to store verification code"
                );
                DomainError::from(e)
            })?;

        if outcome == IssueOutcome::Cooldown {
            tracing::info!(
                scope = scope,
                destination = %masked,
                event = "cooldown_rejected",
                "Verification code requested within cooldown"
            );
            return Ok(SendOutcome::CooldownRejected);
        }

        tracing::info!(
            scope = scope,
            destination = %masked,
            event = "code_issued",
            "Issued new verification code"
        );

        let destinations = [destination.to_string()];
        match self
            .sms_service
            .send(&self.config.template_id, &[code], &destinations)
            .await
        {
            Ok(()) => {
                tracing::info!(
                    scope = scope,
                    destination = %masked,
                    provider = self.sms_service.provider_name(),
                    event = "code_sent",
                    "Verification code dispatched"
                );
                Ok(SendOutcome::Sent)
            }
            Err(e) => {
                tracing::error!(
                    scope = scope,
                    destination = %masked,
                    provider = self.sms_service.provider_name(),
                    error = %e,
                    event = "code_dispatch_failed",
                    "Failed to dispatch verification code"
                );
                Ok(SendOutcome::DispatchFailed(e))
            }
        }
    }

    /// Check a submitted code
    ///
    /// Candidates that are not exactly six ASCII digits are rejected without a
    /// store round trip. Mismatch and exhaustion both read as `NoMatch`.
    pub async fn verify_code(
        &self,
        scope: &str,
        destination: &str,
        candidate: &str,
    ) -> DomainResult<CodeCheck> {
        Self::validate_inputs(scope, destination)?;
        let masked = mask_phone_number(destination);

        if !is_well_formed_code(candidate) {
            tracing::info!(
                scope = scope,
                destination = %masked,
                code_length = candidate.len(),
                event = "invalid_code_format",
                "Malformed verification code rejected"
            );
            return Ok(CodeCheck::NoMatch);
        }

        let outcome = self
            .code_cache
            .verify(scope, destination, candidate)
            .await
            .map_err(|e| {
                tracing::error!(
                    scope = scope,
                    destination = %masked,
                    error = %e,
                    event = "code_verify_failed",
                    "System error during code verification"
                );
                DomainError::from(e)
            })?;

        match outcome {
            VerifyOutcome::Match => {
                tracing::info!(
                    scope = scope,
                    destination = %masked,
                    event = "code_verified",
                    "Verification code accepted"
                );
                Ok(CodeCheck::Match)
            }
            VerifyOutcome::Mismatch => {
                tracing::info!(
                    scope = scope,
                    destination = %masked,
                    event = "code_mismatch",
                    "Verification code did not match"
                );
                Ok(CodeCheck::NoMatch)
            }
            VerifyOutcome::AttemptsExhausted => {
                tracing::warn!(
                    scope = scope,
                    destination = %masked,
                    event = "attempts_exhausted",
                    "Verification attempts exhausted, code discarded"
                );
                Ok(CodeCheck::NoMatch)
            }
        }
    }

    /// Access the configured dispatcher
    pub fn sms_service(&self) -> &Arc<S> {
        &self.sms_service
    }

    fn validate_inputs(scope: &str, destination: &str) -> DomainResult<()> {
        if scope.trim().is_empty() {
            return Err(DomainError::validation("scope must not be empty"));
        }
        if destination.trim().is_empty() {
            return Err(DomainError::validation("destination must not be empty"));
        }
        Ok(())
    }
}
