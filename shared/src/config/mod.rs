//! Configuration module with business-specific sub-modules
//!
//! This module organizes configuration into logical areas:
//! - `cache` - Shared store (Redis) connection and backend selection
//! - `dispatch` - Failover dispatcher tuning
//! - `environment` - Environment detection and logging configuration
//! - `rate_limit` - Sliding window limits
//! - `sms` - Provider list, templates and provider request policy
//! - `verification` - Cooldown, attempt ceiling and record TTL

pub mod cache;
pub mod dispatch;
pub mod environment;
pub mod rate_limit;
pub mod sms;
pub mod verification;

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

// Re-export commonly used types
pub use cache::{CacheConfig, CacheType};
pub use dispatch::{DispatchConfig, DispatchStrategy};
pub use environment::{Environment, LogFormat, LoggingConfig};
pub use rate_limit::{RateLimitConfig, RateWindowConfig};
pub use sms::SmsConfig;
pub use verification::VerificationConfig;

/// Prefix of environment variables overriding configuration values,
/// e.g. `VK__CACHE__URL` or `VK__VERIFICATION__COOLDOWN_SECONDS`
pub const ENV_PREFIX: &str = "VK";

/// Complete application configuration combining all sub-configurations
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Environment configuration
    #[serde(default)]
    pub environment: Environment,

    /// Shared store configuration
    #[serde(default)]
    pub cache: CacheConfig,

    /// Verification code policy
    #[serde(default)]
    pub verification: VerificationConfig,

    /// Dispatcher configuration
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// SMS provider configuration
    #[serde(default)]
    pub sms: SmsConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        let env = Environment::default();
        Self {
            environment: env,
            cache: CacheConfig::default(),
            verification: VerificationConfig::default(),
            dispatch: DispatchConfig::default(),
            rate_limit: RateLimitConfig::default(),
            sms: SmsConfig::default(),
            logging: LoggingConfig::for_environment(env),
        }
    }
}

impl AppConfig {
    /// Create configuration for development environment
    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            cache: CacheConfig::memory(),
            rate_limit: RateLimitConfig::development(),
            logging: LoggingConfig::for_environment(Environment::Development),
            ..Default::default()
        }
    }

    /// Create configuration for production environment
    pub fn production() -> Self {
        Self {
            environment: Environment::Production,
            cache: CacheConfig::default().with_prefix("verifykit"),
            rate_limit: RateLimitConfig::production(),
            logging: LoggingConfig::for_environment(Environment::Production),
            ..Default::default()
        }
    }

    /// Profile defaults for an environment
    pub fn for_environment(env: Environment) -> Self {
        match env {
            Environment::Development => Self::development(),
            Environment::Production => Self::production(),
            Environment::Staging => Self {
                environment: Environment::Staging,
                logging: LoggingConfig::for_environment(Environment::Staging),
                ..Self::production()
            },
        }
    }

    /// Load configuration from layered sources
    ///
    /// Later layers override earlier ones:
    /// 1. profile defaults for the detected environment
    /// 2. optional `config.{environment}.toml` in the working directory
    /// 3. `VK__`-prefixed environment variables (after reading `.env`)
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let env = Environment::from_env();
        let defaults = Self::for_environment(env);

        let settings = config::Config::builder()
            .add_source(config::Config::try_from(&defaults)?)
            .add_source(config::File::with_name(&env.config_file()).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("sms.providers"),
            )
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;

        tracing::debug!(environment = %config.environment, "Configuration loaded");
        Ok(config)
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> Result<(), ConfigError> {
        let verification = &self.verification;
        if verification.cooldown_seconds == 0 {
            return Err(ConfigError::invalid(
                "verification.cooldown_seconds",
                "must be greater than zero",
            ));
        }
        if verification.record_ttl_seconds <= verification.cooldown_seconds {
            return Err(ConfigError::invalid(
                "verification.record_ttl_seconds",
                format!(
                    "must exceed the cooldown of {}s, got {}s",
                    verification.cooldown_seconds, verification.record_ttl_seconds
                ),
            ));
        }
        if verification.max_attempts == 0 {
            return Err(ConfigError::invalid(
                "verification.max_attempts",
                "must be at least 1",
            ));
        }
        let rate = self.dispatch.degradation_rate;
        if rate.is_nan() || rate <= 0.0 {
            return Err(ConfigError::invalid(
                "dispatch.degradation_rate",
                "must be a positive number",
            ));
        }
        if self.rate_limit.dispatch.interval_ms == 0 {
            return Err(ConfigError::invalid(
                "rate_limit.dispatch.interval_ms",
                "must be greater than zero",
            ));
        }
        if matches!(&self.rate_limit.per_destination, Some(window) if window.interval_ms == 0) {
            return Err(ConfigError::invalid(
                "rate_limit.per_destination.interval_ms",
                "must be greater than zero",
            ));
        }
        if self.sms.providers.is_empty() {
            return Err(ConfigError::invalid(
                "sms.providers",
                "at least one provider is required",
            ));
        }
        Ok(())
    }
}
