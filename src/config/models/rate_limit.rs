//! Rate limiting configuration

use super::*;
use serde::{Deserialize, Serialize};

/// Admission policy for one endpoint key or pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointPolicy {
    /// Requests admitted per window
    pub max_requests: u32,
    /// Sliding window length in milliseconds
    pub window_ms: u64,
    /// How long a key stays blocked after exceeding the window
    #[serde(default = "default_block_duration_ms")]
    pub block_duration_ms: u64,
}

impl EndpointPolicy {
    pub const fn new(max_requests: u32, window_ms: u64, block_duration_ms: u64) -> Self {
        Self {
            max_requests,
            window_ms,
            block_duration_ms,
        }
    }
}

impl Default for EndpointPolicy {
    fn default() -> Self {
        Self::new(default_rpm(), 60_000, default_block_duration_ms())
    }
}

/// Policy override keyed by exact endpoint or prefix pattern.
///
/// A trailing `*` in the pattern is ignored when prefix matching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointRule {
    pub pattern: String,
    #[serde(flatten)]
    pub policy: EndpointPolicy,
}

impl EndpointRule {
    pub fn new(pattern: impl Into<String>, policy: EndpointPolicy) -> Self {
        Self {
            pattern: pattern.into(),
            policy,
        }
    }
}

/// Rate limiting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Enable rate limiting
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Fallback policy when no endpoint rule matches
    #[serde(default)]
    pub global: EndpointPolicy,
    /// Per-endpoint overrides, matched in order
    #[serde(default = "default_endpoint_rules")]
    pub endpoints: Vec<EndpointRule>,
    /// Admitted requests per second across all endpoints
    #[serde(default = "default_per_second_limit")]
    pub global_per_second_limit: u32,
    /// Interval between record/block sweeps
    #[serde(default = "default_sweep_interval_ms")]
    pub sweep_interval_ms: u64,
    /// Request records older than this are pruned by the sweep
    #[serde(default = "default_record_retention_ms")]
    pub retention_ms: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            global: EndpointPolicy::default(),
            endpoints: default_endpoint_rules(),
            global_per_second_limit: default_per_second_limit(),
            sweep_interval_ms: default_sweep_interval_ms(),
            retention_ms: default_record_retention_ms(),
        }
    }
}

impl RateLimitConfig {
    /// Merge rate limit configurations (other takes precedence where it
    /// differs from the defaults)
    pub fn merge(mut self, other: Self) -> Self {
        if !other.enabled {
            self.enabled = other.enabled;
        }
        if other.global != EndpointPolicy::default() {
            self.global = other.global;
        }
        for rule in other.endpoints {
            match self.endpoints.iter_mut().find(|r| r.pattern == rule.pattern) {
                Some(existing) => existing.policy = rule.policy,
                None => self.endpoints.push(rule),
            }
        }
        if other.global_per_second_limit != default_per_second_limit() {
            self.global_per_second_limit = other.global_per_second_limit;
        }
        if other.sweep_interval_ms != default_sweep_interval_ms() {
            self.sweep_interval_ms = other.sweep_interval_ms;
        }
        if other.retention_ms != default_record_retention_ms() {
            self.retention_ms = other.retention_ms;
        }
        self
    }
}

/// Stricter limits for auth endpoints, higher limits for read-only analytics
pub fn default_endpoint_rules() -> Vec<EndpointRule> {
    vec![
        EndpointRule::new(
            "/api/traffic-auth/login",
            EndpointPolicy::new(5, 60_000, 5 * 60_000),
        ),
        EndpointRule::new(
            "/api/traffic-auth/refresh",
            EndpointPolicy::new(10, 60_000, 60_000),
        ),
        EndpointRule::new(
            "/api/traffic-analytics",
            EndpointPolicy::new(100, 60_000, 30_000),
        ),
    ]
}
