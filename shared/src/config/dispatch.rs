//! SMS dispatch configuration module

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How outbound sends are spread across providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchStrategy {
    /// Rotate on limiter rejection, provider error and latency degradation
    Adaptive,
    /// Try every provider in turn, starting from a rotating offset
    RoundRobin,
    /// Rotate after too many consecutive timeouts
    Timeout,
}

/// Failover dispatcher configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DispatchConfig {
    /// Dispatch strategy
    #[serde(default = "default_strategy")]
    pub strategy: DispatchStrategy,

    /// Retry window for callers layering retries on top of the dispatcher
    #[serde(default = "default_retry_window_secs")]
    pub retry_window_secs: u64,

    /// Attempt ceiling for callers layering retries on top of the dispatcher
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Ratio of current to baseline latency that triggers rotation
    #[serde(default = "default_degradation_rate")]
    pub degradation_rate: f64,

    /// Absolute latency ceiling in milliseconds that triggers rotation
    #[serde(default = "default_latency_ceiling_ms")]
    pub latency_ceiling_ms: u64,

    /// Limiter key representing overall dispatch pressure
    #[serde(default = "default_limiter_key")]
    pub limiter_key: String,

    /// Consecutive timeouts tolerated by the timeout strategy
    #[serde(default = "default_timeout_threshold")]
    pub timeout_threshold: u32,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            strategy: default_strategy(),
            retry_window_secs: default_retry_window_secs(),
            retry_count: default_retry_count(),
            degradation_rate: default_degradation_rate(),
            latency_ceiling_ms: default_latency_ceiling_ms(),
            limiter_key: default_limiter_key(),
            timeout_threshold: default_timeout_threshold(),
        }
    }
}

impl DispatchConfig {
    /// Retry window
    pub fn retry_window(&self) -> Duration {
        Duration::from_secs(self.retry_window_secs)
    }

    /// Absolute latency ceiling
    pub fn latency_ceiling(&self) -> Duration {
        Duration::from_millis(self.latency_ceiling_ms)
    }

    /// Override the degradation multiplier
    pub fn with_degradation_rate(mut self, rate: f64) -> Self {
        self.degradation_rate = rate;
        self
    }

    /// Override the absolute latency ceiling
    pub fn with_latency_ceiling(mut self, ceiling: Duration) -> Self {
        self.latency_ceiling_ms = ceiling.as_millis() as u64;
        self
    }
}

fn default_strategy() -> DispatchStrategy {
    DispatchStrategy::Adaptive
}

fn default_retry_window_secs() -> u64 {
    10
}

fn default_retry_count() -> u32 {
    5
}

fn default_degradation_rate() -> f64 {
    5.0
}

fn default_latency_ceiling_ms() -> u64 {
    1000
}

fn default_limiter_key() -> String {
    String::from("sms:dispatch")
}

fn default_timeout_threshold() -> u32 {
    3
}
