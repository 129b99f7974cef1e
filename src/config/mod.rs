//! Configuration management for the shield
//!
//! This module handles loading, validation, and merging of the shield
//! configuration. Every section has defaults, so an empty document is a
//! valid configuration.

pub mod models;
pub mod validation;

pub use models::*;
pub use validation::Validate;

use crate::utils::error::{Result, ShieldError};
use crate::utils::logging::LogLevel;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// Environment variable overriding the global requests per minute
pub const ENV_GLOBAL_RPM: &str = "SHIELD_GLOBAL_RPM";
/// Environment variable overriding the global per-second ceiling
pub const ENV_PER_SECOND_LIMIT: &str = "SHIELD_PER_SECOND_LIMIT";
/// Environment variable overriding the error rate threshold
pub const ENV_ERROR_RATE_THRESHOLD: &str = "SHIELD_ERROR_RATE_THRESHOLD";
/// Environment variable overriding the idle session timeout
pub const ENV_SESSION_TIMEOUT_MS: &str = "SHIELD_SESSION_TIMEOUT_MS";
/// Environment variable providing the store encryption key
pub const ENV_ENCRYPTION_KEY: &str = "SHIELD_ENCRYPTION_KEY";

/// Main configuration struct for the shield
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShieldConfig {
    /// Admission controller configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    /// Health aggregator configuration
    #[serde(default)]
    pub health: HealthConfig,
    /// Protected store configuration
    #[serde(default)]
    pub storage: StorageConfig,
    /// Default log level when `SHIELD_LOG` is unset
    #[serde(default)]
    pub log_level: LogLevel,
}

impl ShieldConfig {
    /// Load configuration from a YAML file
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading configuration from: {:?}", path);

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ShieldError::Config(format!("Failed to read config file: {}", e)))?;

        let config = Self::from_yaml_str(&content)?;
        debug!("Configuration loaded successfully");
        Ok(config)
    }

    /// Parse and validate configuration from a YAML document
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config: Self = if content.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(content)
                .map_err(|e| ShieldError::Config(format!("Failed to parse config: {}", e)))?
        };

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from defaults plus `SHIELD_*` environment variables.
    ///
    /// A `.env` file in the working directory is read first when present.
    pub fn from_env() -> Result<Self> {
        info!("Loading configuration from environment variables");
        dotenvy::dotenv().ok();

        let mut config = Self::default();
        config.apply_env_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(rpm) = parse_env(&lookup, ENV_GLOBAL_RPM)? {
            self.rate_limit.global.max_requests = rpm;
        }
        if let Some(limit) = parse_env(&lookup, ENV_PER_SECOND_LIMIT)? {
            self.rate_limit.global_per_second_limit = limit;
        }
        if let Some(threshold) = parse_env(&lookup, ENV_ERROR_RATE_THRESHOLD)? {
            self.health.error_rate_threshold = threshold;
        }
        if let Some(timeout) = parse_env(&lookup, ENV_SESSION_TIMEOUT_MS)? {
            self.storage.session_timeout_ms = timeout;
        }
        if let Some(key) = lookup(ENV_ENCRYPTION_KEY).filter(|k| !k.is_empty()) {
            self.storage.encryption_key = Some(key);
        }
        Ok(())
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        debug!("Validating configuration");

        self.rate_limit
            .validate()
            .map_err(|e| ShieldError::Config(format!("Rate limit config error: {}", e)))?;
        self.health
            .validate()
            .map_err(|e| ShieldError::Config(format!("Health config error: {}", e)))?;
        self.storage
            .validate()
            .map_err(|e| ShieldError::Config(format!("Storage config error: {}", e)))?;

        Ok(())
    }

    /// Merge with another configuration (other takes precedence)
    pub fn merge(mut self, other: Self) -> Self {
        self.rate_limit = self.rate_limit.merge(other.rate_limit);
        self.health = self.health.merge(other.health);
        self.storage = self.storage.merge(other.storage);
        if other.log_level != LogLevel::default() {
            self.log_level = other.log_level;
        }
        self
    }

    /// Convert to YAML string
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self)
            .map_err(|e| ShieldError::Config(format!("Failed to serialize config to YAML: {}", e)))
    }
}

fn parse_env<F, T>(lookup: &F, name: &str) -> Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ShieldError::Config(format!("Invalid value for {}: {:?}", name, raw))),
    }
}
