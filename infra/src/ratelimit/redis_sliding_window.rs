//! Redis-based sliding window limiter
//!
//! Admitted requests are kept as members of a sorted set scored by their
//! millisecond timestamp. Pruning, counting and recording happen in one Lua
//! script, so concurrent callers never admit more than `rate` per window.

use async_trait::async_trait;
use chrono::Utc;
use redis::Script;
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

use vk_core::errors::StoreError;
use vk_core::services::RateLimiterTrait;
use vk_shared::RateWindowConfig;

use crate::cache::RedisClient;

const SLIDING_WINDOW_LUA: &str = include_str!("lua/sliding_window.lua");

/// Redis-backed implementation of the rate limiter trait
#[derive(Clone)]
pub struct RedisSlidingWindowLimiter {
    redis_client: RedisClient,
    interval: Duration,
    rate: u32,
    script: Script,
}

impl RedisSlidingWindowLimiter {
    /// Create a limiter admitting `rate` requests per `interval` for each key
    pub fn new(redis_client: RedisClient, interval: Duration, rate: u32) -> Self {
        Self {
            redis_client,
            interval,
            rate,
            script: Script::new(SLIDING_WINDOW_LUA),
        }
    }

    /// Create a limiter from a configured window
    pub fn from_config(redis_client: RedisClient, window: &RateWindowConfig) -> Self {
        Self::new(redis_client, window.interval(), window.rate)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn rate(&self) -> u32 {
        self.rate
    }
}

#[async_trait]
impl RateLimiterTrait for RedisSlidingWindowLimiter {
    async fn limit(&self, key: &str) -> Result<bool, StoreError> {
        if key.is_empty() {
            return Err(StoreError::InvalidKey("rate limit key must not be empty".to_string()));
        }
        let redis_key = self.redis_client.make_key(&format!("rate_limit:{}", key));

        let now = Utc::now().timestamp_millis();
        // Unique member so requests in the same millisecond are all counted
        let member = format!("{}-{}", now, Uuid::new_v4());

        let mut invocation = self.script.prepare_invoke();
        invocation
            .key(&redis_key)
            .arg(self.interval.as_millis() as u64)
            .arg(self.rate)
            .arg(now)
            .arg(member);

        let reply: i64 = self.redis_client.eval_script(&invocation).await?;
        match reply {
            0 => Ok(false),
            1 => {
                debug!(
                    key = key,
                    rate = self.rate,
                    interval_ms = self.interval.as_millis() as u64,
                    "Rate limit reached"
                );
                Ok(true)
            }
            other => {
                warn!(key = key, reply = other, "Unexpected sliding window reply");
                Err(StoreError::UnexpectedReply {
                    script: "sliding_window".to_string(),
                    code: other,
                })
            }
        }
    }
}
