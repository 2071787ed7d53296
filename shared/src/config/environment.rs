//! Environment and logging configuration module

use serde::{Deserialize, Serialize};
use std::env;
use tracing_subscriber::EnvFilter;

use crate::errors::ConfigError;

/// Deployment profile the process runs under
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

/// Variables consulted for the profile, first match wins
const ENVIRONMENT_VARS: [&str; 3] = ["ENVIRONMENT", "ENV", "RUST_ENV"];

impl Environment {
    pub fn is_production(&self) -> bool {
        *self == Environment::Production
    }

    pub fn is_development(&self) -> bool {
        *self == Environment::Development
    }

    /// Detect the profile from the environment; unknown values fall back to
    /// development
    pub fn from_env() -> Self {
        ENVIRONMENT_VARS
            .iter()
            .find_map(|name| env::var(name).ok())
            .and_then(|value| value.parse().ok())
            .unwrap_or_default()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }

    /// Optional profile file, without extension: `config.{profile}`
    pub fn config_file(&self) -> String {
        format!("config.{}", self.as_str())
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "staging" | "stage" | "test" => Ok(Environment::Staging),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(ConfigError::invalid(
                "environment",
                format!("unknown profile '{}'", other),
            )),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error); `RUST_LOG` takes precedence
    #[serde(default = "default_level")]
    pub level: String,

    /// Log format
    #[serde(default = "default_log_format")]
    pub format: LogFormat,

    /// Include source location in logs
    #[serde(default)]
    pub source_location: bool,
}

/// Log format enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
    Compact,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: default_log_format(),
            source_location: false,
        }
    }
}

impl LoggingConfig {
    /// Profile defaults: verbose pretty output locally, JSON elsewhere
    pub fn for_environment(env: Environment) -> Self {
        if env.is_development() {
            Self {
                level: String::from("debug"),
                format: LogFormat::Pretty,
                source_location: true,
            }
        } else {
            Self {
                level: default_level(),
                format: LogFormat::Json,
                source_location: false,
            }
        }
    }

    /// Install the global `tracing` subscriber
    ///
    /// Fails if a global subscriber is already installed.
    pub fn init(&self) -> Result<(), ConfigError> {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&self.level))
            .map_err(|e| ConfigError::invalid("logging.level", e.to_string()))?;

        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_file(self.source_location)
            .with_line_number(self.source_location);

        let result = match self.format {
            LogFormat::Json => builder.json().try_init(),
            LogFormat::Pretty => builder.pretty().try_init(),
            LogFormat::Compact => builder.compact().try_init(),
        };

        result.map_err(|e| ConfigError::Logging(e.to_string()))
    }
}

fn default_level() -> String {
    String::from("info")
}

fn default_log_format() -> LogFormat {
    LogFormat::Pretty
}
