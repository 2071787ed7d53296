//! Rate limiting configuration module

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Sliding window parameters: at most `rate` admissions per `interval_ms`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct RateWindowConfig {
    /// Window duration in milliseconds
    pub interval_ms: u64,

    /// Max admitted requests per window
    pub rate: u32,
}

impl RateWindowConfig {
    /// Create a window of `rate` admissions per `interval`
    pub fn new(interval: Duration, rate: u32) -> Self {
        Self {
            interval_ms: interval.as_millis() as u64,
            rate,
        }
    }

    /// Window duration
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// Rate limiting configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitConfig {
    /// Window guarding the dispatcher (all sends through one process group)
    #[serde(default = "default_dispatch_window")]
    pub dispatch: RateWindowConfig,

    /// Optional window applied per destination in front of the dispatcher
    #[serde(default)]
    pub per_destination: Option<RateWindowConfig>,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            dispatch: default_dispatch_window(),
            per_destination: None,
        }
    }
}

impl RateLimitConfig {
    /// Development configuration (lenient limits)
    pub fn development() -> Self {
        Self {
            dispatch: RateWindowConfig::new(Duration::from_secs(1), 1000),
            per_destination: None,
        }
    }

    /// Production configuration
    pub fn production() -> Self {
        Self {
            dispatch: default_dispatch_window(),
            per_destination: Some(RateWindowConfig::new(Duration::from_secs(3600), 10)),
        }
    }
}

fn default_dispatch_window() -> RateWindowConfig {
    RateWindowConfig::new(Duration::from_secs(1), 100)
}
