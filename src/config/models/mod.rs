//! Configuration data models
//!
//! This module defines all configuration structures used by the shield.

#![allow(missing_docs)]

pub mod monitoring;
pub mod rate_limit;
pub mod storage;

// Re-export all configuration types
pub use monitoring::*;
pub use rate_limit::*;
pub use storage::*;

/// Default boolean value (true)
pub fn default_true() -> bool {
    true
}

/// Default requests per minute for the global policy
pub fn default_rpm() -> u32 {
    60
}

/// Default block duration after a window is exceeded
pub fn default_block_duration_ms() -> u64 {
    60_000
}

/// Default global per-second ceiling
pub fn default_per_second_limit() -> u32 {
    10
}

/// Default rate limiter sweep interval
pub fn default_sweep_interval_ms() -> u64 {
    60_000
}

/// Default retention of request records
pub fn default_record_retention_ms() -> u64 {
    5 * 60_000
}

/// Default errors per minute threshold
pub fn default_error_rate_threshold() -> f64 {
    10.0
}

/// Default average response time threshold
pub fn default_response_time_threshold_ms() -> f64 {
    3000.0
}

/// Default memory usage threshold
pub fn default_memory_threshold_percent() -> f64 {
    80.0
}

/// Default failed requests per minute threshold
pub fn default_failed_request_threshold() -> u64 {
    5
}

/// Default periodic check interval
pub fn default_check_interval_ms() -> u64 {
    60_000
}

/// Default sample retention
pub fn default_retention_minutes() -> u64 {
    60
}

/// Default idle session timeout (30 minutes)
pub fn default_session_timeout_ms() -> u64 {
    30 * 60_000
}
