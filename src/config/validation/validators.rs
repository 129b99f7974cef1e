//! Section validators

use super::trait_def::Validate;
use crate::config::models::*;
use tracing::debug;

impl Validate for EndpointPolicy {
    fn validate(&self) -> Result<(), String> {
        if self.max_requests == 0 {
            return Err("max_requests must be greater than 0".to_string());
        }
        if self.window_ms == 0 {
            return Err("window_ms must be greater than 0".to_string());
        }
        Ok(())
    }
}

impl Validate for RateLimitConfig {
    fn validate(&self) -> Result<(), String> {
        debug!("Validating rate limit configuration");

        self.global
            .validate()
            .map_err(|e| format!("global policy: {}", e))?;

        for rule in &self.endpoints {
            if rule.pattern.trim_end_matches('*').is_empty() {
                return Err("Endpoint pattern cannot be empty".to_string());
            }
            rule.policy
                .validate()
                .map_err(|e| format!("endpoint '{}': {}", rule.pattern, e))?;
        }

        if self.global_per_second_limit == 0 {
            return Err("global_per_second_limit must be greater than 0".to_string());
        }
        if self.sweep_interval_ms == 0 {
            return Err("sweep_interval_ms must be greater than 0".to_string());
        }
        if self.retention_ms == 0 {
            return Err("retention_ms must be greater than 0".to_string());
        }

        Ok(())
    }
}

impl Validate for HealthConfig {
    fn validate(&self) -> Result<(), String> {
        debug!("Validating health configuration");

        if self.error_rate_threshold.is_nan() || self.error_rate_threshold <= 0.0 {
            return Err("error_rate_threshold must be greater than 0".to_string());
        }
        if self.response_time_threshold_ms.is_nan() || self.response_time_threshold_ms <= 0.0 {
            return Err("response_time_threshold_ms must be greater than 0".to_string());
        }
        if self.memory_threshold_percent.is_nan()
            || self.memory_threshold_percent <= 0.0
            || self.memory_threshold_percent > 100.0
        {
            return Err("memory_threshold_percent must be within (0, 100]".to_string());
        }
        if self.failed_request_threshold == 0 {
            return Err("failed_request_threshold must be greater than 0".to_string());
        }
        if self.check_interval_ms == 0 {
            return Err("check_interval_ms must be greater than 0".to_string());
        }
        if self.retention_minutes == 0 {
            return Err("retention_minutes must be greater than 0".to_string());
        }

        Ok(())
    }
}

impl Validate for StorageConfig {
    fn validate(&self) -> Result<(), String> {
        debug!("Validating storage configuration");

        if self.session_timeout_ms == 0 {
            return Err("session_timeout_ms must be greater than 0".to_string());
        }
        if self.check_interval_ms == 0 {
            return Err("check_interval_ms must be greater than 0".to_string());
        }
        if let Some(key) = &self.encryption_key {
            if key.is_empty() {
                return Err("encryption_key cannot be empty when set".to_string());
            }
        }

        Ok(())
    }
}
