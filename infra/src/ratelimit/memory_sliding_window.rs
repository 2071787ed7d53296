//! In-process sliding window limiter

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::debug;

use vk_core::errors::StoreError;
use vk_core::services::RateLimiterTrait;
use vk_shared::RateWindowConfig;

/// Checks between two sweeps of idle keys
const SWEEP_EVERY: u64 = 256;

/// Sliding window limiter keeping admitted timestamps per key in memory
#[derive(Debug)]
pub struct MemorySlidingWindowLimiter {
    windows: DashMap<String, VecDeque<i64>>,
    interval: Duration,
    rate: u32,
    checks: AtomicU64,
}

impl MemorySlidingWindowLimiter {
    /// Create a limiter admitting `rate` requests per `interval` for each key
    pub fn new(interval: Duration, rate: u32) -> Self {
        Self {
            windows: DashMap::new(),
            interval,
            rate,
            checks: AtomicU64::new(0),
        }
    }

    /// Create a limiter from a configured window
    pub fn from_config(window: &RateWindowConfig) -> Self {
        Self::new(window.interval(), window.rate)
    }

    /// Number of keys currently tracked
    pub fn tracked_keys(&self) -> usize {
        self.windows.len()
    }

    /// Drop keys whose newest admission fell out of the window
    pub fn sweep_idle(&self) {
        let cutoff = Utc::now().timestamp_millis() - self.interval_ms();
        self.windows
            .retain(|_, timestamps| timestamps.back().map_or(false, |&ts| ts > cutoff));
    }

    fn interval_ms(&self) -> i64 {
        self.interval.as_millis() as i64
    }

    fn check(&self, key: &str, now: i64) -> bool {
        let cutoff = now - self.interval_ms();
        let mut window = self.windows.entry(key.to_string()).or_default();

        while window.front().map_or(false, |&ts| ts <= cutoff) {
            window.pop_front();
        }

        if window.len() >= self.rate as usize {
            return true;
        }
        window.push_back(now);
        false
    }
}

#[async_trait]
impl RateLimiterTrait for MemorySlidingWindowLimiter {
    async fn limit(&self, key: &str) -> Result<bool, StoreError> {
        if key.is_empty() {
            return Err(StoreError::InvalidKey("rate limit key must not be empty".to_string()));
        }

        let limited = self.check(key, Utc::now().timestamp_millis());
        if limited {
            debug!(key = key, rate = self.rate, "Rate limit reached");
        }

        if self.checks.fetch_add(1, Ordering::Relaxed) % SWEEP_EVERY == SWEEP_EVERY - 1 {
            self.sweep_idle();
        }
        Ok(limited)
    }
}
