//! Rate limiter types and data structures

use serde::{Deserialize, Serialize};

/// Key of the block entry that applies to every endpoint
pub const GLOBAL_BLOCK_KEY: &str = "*";

/// Outcome of [`RateLimiter::check_and_record`](super::RateLimiter::check_and_record)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdmissionDecision {
    /// Whether the request may proceed
    pub allowed: bool,
    /// Why the request was denied
    pub reason: Option<String>,
    /// Hint for when a retry may succeed (only set when denied)
    pub retry_after_ms: Option<u64>,
}

impl AdmissionDecision {
    pub(super) fn allow() -> Self {
        Self {
            allowed: true,
            reason: None,
            retry_after_ms: None,
        }
    }

    pub(super) fn deny(reason: impl Into<String>, retry_after_ms: u64) -> Self {
        Self {
            allowed: false,
            reason: Some(reason.into()),
            retry_after_ms: Some(retry_after_ms),
        }
    }

    /// Convert a denial into the error surfaced to callers
    pub fn into_result(self) -> crate::utils::error::Result<()> {
        if self.allowed {
            Ok(())
        } else {
            Err(crate::utils::error::ShieldError::rate_limit(
                self.reason.unwrap_or_else(|| "Rate limit exceeded".to_string()),
                self.retry_after_ms.unwrap_or(0),
            ))
        }
    }
}

/// A blocked endpoint key, or [`GLOBAL_BLOCK_KEY`] for a global block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockEntry {
    pub endpoint_key: String,
    pub blocked_until_ms: u64,
    pub reason: String,
}

impl BlockEntry {
    pub fn is_live(&self, now_ms: u64) -> bool {
        self.blocked_until_ms > now_ms
    }

    pub fn remaining_ms(&self, now_ms: u64) -> u64 {
        self.blocked_until_ms.saturating_sub(now_ms)
    }
}

/// Read-only view of one endpoint key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitStatus {
    /// Requests recorded inside the current window
    pub requests_in_window: u32,
    /// Maximum requests per window for the resolved policy
    pub max_requests: u32,
    /// Window length of the resolved policy
    pub window_ms: u64,
    /// Requests left before the key is blocked
    pub remaining: u32,
    /// Whether a live block applies to the key
    pub is_blocked: bool,
    /// Reason of the live block, if any
    pub blocked_reason: Option<String>,
}

/// Fixed one-second bucket backing the global ceiling
#[derive(Debug, Clone, Copy, Default)]
pub(super) struct SecondBucket {
    pub(super) start_ms: u64,
    pub(super) count: u32,
}
