//! Health monitoring configuration

use super::*;
use serde::{Deserialize, Serialize};

/// Health aggregation thresholds and timers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthConfig {
    /// Record and evaluate samples
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Errors per minute before alerting
    #[serde(default = "default_error_rate_threshold")]
    pub error_rate_threshold: f64,
    /// Average response time (ms) before alerting
    #[serde(default = "default_response_time_threshold_ms")]
    pub response_time_threshold_ms: f64,
    /// Memory usage percentage before alerting
    #[serde(default = "default_memory_threshold_percent")]
    pub memory_threshold_percent: f64,
    /// Failed (status >= 400) requests per minute before alerting
    #[serde(default = "default_failed_request_threshold")]
    pub failed_request_threshold: u64,
    /// Health check interval
    #[serde(default = "default_check_interval_ms")]
    pub check_interval_ms: u64,
    /// How long samples are kept
    #[serde(default = "default_retention_minutes")]
    pub retention_minutes: u64,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            error_rate_threshold: default_error_rate_threshold(),
            response_time_threshold_ms: default_response_time_threshold_ms(),
            memory_threshold_percent: default_memory_threshold_percent(),
            failed_request_threshold: default_failed_request_threshold(),
            check_interval_ms: default_check_interval_ms(),
            retention_minutes: default_retention_minutes(),
        }
    }
}

impl HealthConfig {
    /// Sample retention in milliseconds
    pub fn retention_ms(&self) -> u64 {
        self.retention_minutes.saturating_mul(60_000)
    }

    /// Merge health configurations
    pub fn merge(mut self, other: Self) -> Self {
        if !other.enabled {
            self.enabled = other.enabled;
        }
        if other.error_rate_threshold != default_error_rate_threshold() {
            self.error_rate_threshold = other.error_rate_threshold;
        }
        if other.response_time_threshold_ms != default_response_time_threshold_ms() {
            self.response_time_threshold_ms = other.response_time_threshold_ms;
        }
        if other.memory_threshold_percent != default_memory_threshold_percent() {
            self.memory_threshold_percent = other.memory_threshold_percent;
        }
        if other.failed_request_threshold != default_failed_request_threshold() {
            self.failed_request_threshold = other.failed_request_threshold;
        }
        if other.check_interval_ms != default_check_interval_ms() {
            self.check_interval_ms = other.check_interval_ms;
        }
        if other.retention_minutes != default_retention_minutes() {
            self.retention_minutes = other.retention_minutes;
        }
        self
    }
}
