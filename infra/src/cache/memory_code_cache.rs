//! In-process verification code cache
//!
//! Same contract as [`RedisCodeCache`](crate::cache::RedisCodeCache) for a
//! single process: development setups without Redis and tests. Records are
//! not shared between processes.

use async_trait::async_trait;
use chrono::Utc;
use constant_time_eq::constant_time_eq;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

use vk_core::domain::{CodeKey, CodePolicy, IssueOutcome, VerifyOutcome};
use vk_core::errors::StoreError;
use vk_core::services::CodeCacheTrait;

/// Operations between two sweeps of expired records
const SWEEP_EVERY: u64 = 1024;

#[derive(Debug, Clone)]
struct CodeRecord {
    code: String,
    try_count: u32,
    issued_at_ms: i64,
    expires_at_ms: i64,
}

impl CodeRecord {
    fn is_expired(&self, now_ms: i64) -> bool {
        now_ms >= self.expires_at_ms
    }
}

/// Verification code cache backed by a concurrent map
#[derive(Debug)]
pub struct MemoryCodeCache {
    records: DashMap<CodeKey, CodeRecord>,
    policy: CodePolicy,
    ops: AtomicU64,
}

impl MemoryCodeCache {
    pub fn new(policy: CodePolicy) -> Self {
        Self {
            records: DashMap::new(),
            policy,
            ops: AtomicU64::new(0),
        }
    }

    /// Number of records currently held, expired ones included until swept
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Drop every expired record
    pub fn purge_expired(&self) {
        let now_ms = Utc::now().timestamp_millis();
        self.records.retain(|_, record| !record.is_expired(now_ms));
    }

    fn fresh_record(&self, code: &str, now_ms: i64) -> CodeRecord {
        CodeRecord {
            code: code.to_string(),
            try_count: self.policy.max_attempts,
            issued_at_ms: now_ms,
            expires_at_ms: now_ms + self.policy.record_ttl_ms() as i64,
        }
    }

    fn maybe_sweep(&self) {
        if self.ops.fetch_add(1, Ordering::Relaxed) % SWEEP_EVERY == SWEEP_EVERY - 1 {
            self.purge_expired();
        }
    }
}

impl Default for MemoryCodeCache {
    fn default() -> Self {
        Self::new(CodePolicy::default())
    }
}

#[async_trait]
impl CodeCacheTrait for MemoryCodeCache {
    async fn issue(
        &self,
        scope: &str,
        destination: &str,
        code: &str,
    ) -> Result<IssueOutcome, StoreError> {
        let key = CodeKey::new(scope, destination)?;
        let now_ms = Utc::now().timestamp_millis();
        let cooldown_ms = self.policy.cooldown_ms() as i64;

        let outcome = match self.records.entry(key) {
            Entry::Occupied(mut entry) => {
                let record = entry.get();
                if !record.is_expired(now_ms) && now_ms - record.issued_at_ms < cooldown_ms {
                    IssueOutcome::Cooldown
                } else {
                    entry.insert(self.fresh_record(code, now_ms));
                    IssueOutcome::Admitted
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(self.fresh_record(code, now_ms));
                IssueOutcome::Admitted
            }
        };

        self.maybe_sweep();
        Ok(outcome)
    }

    async fn verify(
        &self,
        scope: &str,
        destination: &str,
        candidate: &str,
    ) -> Result<VerifyOutcome, StoreError> {
        let key = CodeKey::new(scope, destination)?;
        let now_ms = Utc::now().timestamp_millis();

        let outcome = match self.records.entry(key) {
            Entry::Vacant(_) => VerifyOutcome::Mismatch,
            Entry::Occupied(mut entry) => {
                let record = entry.get_mut();
                if record.is_expired(now_ms) {
                    entry.remove();
                    VerifyOutcome::Mismatch
                } else if record.try_count == 0 {
                    entry.remove();
                    VerifyOutcome::AttemptsExhausted
                } else if constant_time_eq(record.code.as_bytes(), candidate.as_bytes()) {
                    entry.remove();
                    VerifyOutcome::Match
                } else {
                    record.try_count -= 1;
                    if record.try_count == 0 {
                        entry.remove();
                        VerifyOutcome::AttemptsExhausted
                    } else {
                        VerifyOutcome::Mismatch
                    }
                }
            }
        };

        debug!("In-process verification finished with {:?}", outcome);
        self.maybe_sweep();
        Ok(outcome)
    }
}
