//! Shared store configuration

use serde::{Deserialize, Serialize};

/// Where verification records and rate windows live
///
/// Missing fields take their value from [`CacheConfig::default`].
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    pub cache_type: CacheType,

    /// Redis connection URL; ignored for [`CacheType::Memory`]
    pub url: String,

    /// Namespace prepended to every key as `{prefix}:{key}`
    pub key_prefix: Option<String>,

    /// Attempts for connecting and for idempotent commands
    pub max_retries: u32,

    /// First retry delay in milliseconds, doubled per attempt
    pub retry_delay_ms: u64,
}

/// Store backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheType {
    /// Shared by every service instance
    #[default]
    Redis,
    /// Per-process maps; development and tests
    Memory,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_type: CacheType::default(),
            url: "redis://localhost:6379".to_string(),
            key_prefix: None,
            max_retries: 3,
            retry_delay_ms: 100,
        }
    }
}

impl CacheConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// In-process store, no Redis needed
    pub fn memory() -> Self {
        Self {
            cache_type: CacheType::Memory,
            ..Self::default()
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = Some(prefix.into());
        self
    }

    pub fn make_key(&self, key: &str) -> String {
        self.key_prefix
            .as_deref()
            .map_or_else(|| key.to_string(), |prefix| format!("{}:{}", prefix, key))
    }
}
