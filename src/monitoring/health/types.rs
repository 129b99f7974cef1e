//! Sample types recorded by the health monitor

use serde::{Deserialize, Serialize};

/// One recorded error
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorSample {
    pub timestamp_ms: u64,
    pub message: String,
    pub endpoint: Option<String>,
    pub status_code: Option<u16>,
}

impl ErrorSample {
    /// Whether the error came from a failed HTTP response
    pub fn is_failed_request(&self) -> bool {
        self.status_code.is_some_and(|status| status >= 400)
    }
}

/// One recorded response time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatencySample {
    pub timestamp_ms: u64,
    pub endpoint: String,
    pub duration_ms: f64,
}
