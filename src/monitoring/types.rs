//! Type definitions for health metrics and alerts

use serde::{Deserialize, Serialize};

/// What an alert was raised for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    ErrorRate,
    ResponseTime,
    Memory,
    Failures,
    Custom,
}

impl std::fmt::Display for AlertKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertKind::ErrorRate => write!(f, "error_rate"),
            AlertKind::ResponseTime => write!(f, "response_time"),
            AlertKind::Memory => write!(f, "memory"),
            AlertKind::Failures => write!(f, "failures"),
            AlertKind::Custom => write!(f, "custom"),
        }
    }
}

/// Alert severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    #[default]
    Warning,
    Critical,
}

impl std::fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertSeverity::Warning => write!(f, "WARNING"),
            AlertSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Alert information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    /// Alert ID
    pub id: String,
    /// What the alert was raised for
    pub kind: AlertKind,
    /// Human readable description
    pub message: String,
    /// Alert severity
    pub severity: AlertSeverity,
    /// Creation time in epoch milliseconds
    pub created_at_ms: u64,
    /// Whether the alert is resolved
    pub resolved: bool,
}

/// Overall client health
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "healthy"),
            HealthStatus::Degraded => write!(f, "degraded"),
            HealthStatus::Unhealthy => write!(f, "unhealthy"),
        }
    }
}

/// Derived health metrics
///
/// Everything except `successful_requests` and `uptime_ms` covers the
/// trailing minute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthMetrics {
    /// Errors in the last minute
    pub error_rate: f64,
    /// Mean response time in the last minute, 0 without samples
    pub avg_response_time_ms: f64,
    /// Memory usage percentage, 0 when no probe is available
    pub memory_usage_percent: f64,
    /// Errors with status >= 400 in the last minute
    pub failed_requests: u64,
    /// Successful requests since start
    pub successful_requests: u64,
    /// Time since start
    pub uptime_ms: u64,
}
