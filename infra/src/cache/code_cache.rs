//! Redis-backed verification code cache
//!
//! Each `(scope, destination)` pair owns one hash:
//! - `verification:code:{scope}:{destination}` with fields `code`,
//!   `try_count` and `issued_at` (server clock, ms)
//!
//! Issue and verify each run as a single Lua script so concurrent callers on
//! any number of service instances observe one consistent record.

use async_trait::async_trait;
use redis::Script;
use tracing::{debug, info, warn};

use vk_core::domain::{CodeKey, CodePolicy, IssueOutcome, VerifyOutcome};
use vk_core::errors::StoreError;
use vk_core::services::CodeCacheTrait;
use vk_shared::phone::mask_phone_number;

use crate::cache::RedisClient;

const ISSUE_CODE_LUA: &str = include_str!("lua/issue_code.lua");
const VERIFY_CODE_LUA: &str = include_str!("lua/verify_code.lua");

/// Verification code cache shared by every service instance through Redis
#[derive(Clone)]
pub struct RedisCodeCache {
    /// Redis client for cache operations
    redis_client: RedisClient,
    /// Cooldown, attempt budget and record lifetime
    policy: CodePolicy,
    issue_script: Script,
    verify_script: Script,
}

impl RedisCodeCache {
    /// Create a new code cache
    ///
    /// # Example
    /// ```no_run
    /// use vk_core::domain::CodePolicy;
    /// use vk_infra::cache::{RedisClient, RedisCodeCache};
    ///
    /// fn create_cache(redis_client: RedisClient) -> RedisCodeCache {
    ///     RedisCodeCache::new(redis_client, CodePolicy::default())
    /// }
    /// ```
    pub fn new(redis_client: RedisClient, policy: CodePolicy) -> Self {
        Self {
            redis_client,
            policy,
            issue_script: Script::new(ISSUE_CODE_LUA),
            verify_script: Script::new(VERIFY_CODE_LUA),
        }
    }

    /// Policy applied by this cache
    pub fn policy(&self) -> &CodePolicy {
        &self.policy
    }

    /// Full Redis key of a record, including the deployment prefix
    pub fn record_key(&self, scope: &str, destination: &str) -> Result<String, StoreError> {
        let key = CodeKey::new(scope, destination)?;
        Ok(self.redis_client.make_key(&key.storage_key()))
    }
}

#[async_trait]
impl CodeCacheTrait for RedisCodeCache {
    async fn issue(
        &self,
        scope: &str,
        destination: &str,
        code: &str,
    ) -> Result<IssueOutcome, StoreError> {
        let key = self.record_key(scope, destination)?;
        debug!(
            "Issuing verification code for {}:{}",
            scope,
            mask_phone_number(destination)
        );

        let mut invocation = self.issue_script.prepare_invoke();
        invocation
            .key(&key)
            .arg(code)
            .arg(self.policy.max_attempts)
            .arg(self.policy.cooldown_ms())
            .arg(self.policy.record_ttl_ms());

        let reply: i64 = self.redis_client.eval_script(&invocation).await?;
        let outcome = IssueOutcome::from_reply(reply)?;

        match outcome {
            IssueOutcome::Admitted => info!(
                "Verification code stored for {}:{}",
                scope,
                mask_phone_number(destination)
            ),
            IssueOutcome::Cooldown => debug!(
                "Verification code for {}:{} still inside cooldown",
                scope,
                mask_phone_number(destination)
            ),
        }

        Ok(outcome)
    }

    async fn verify(
        &self,
        scope: &str,
        destination: &str,
        candidate: &str,
    ) -> Result<VerifyOutcome, StoreError> {
        let key = self.record_key(scope, destination)?;

        let mut invocation = self.verify_script.prepare_invoke();
        invocation.key(&key).arg(candidate);

        let reply: i64 = self.redis_client.eval_script(&invocation).await?;
        let outcome = VerifyOutcome::from_reply(reply).map_err(|e| {
            warn!("Malformed verification record at '{}': {}", key, e);
            e
        })?;

        debug!(
            "Verification for {}:{} finished with {:?}",
            scope,
            mask_phone_number(destination),
            outcome
        );

        Ok(outcome)
    }
}
