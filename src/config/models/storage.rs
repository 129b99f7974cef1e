//! Protected store configuration

use super::*;
use crate::utils::auth::crypto::{DEFAULT_VISIBLE_CHARS, mask_sensitive_data};
use serde::{Deserialize, Serialize};

/// Protected store configuration
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Idle time after which every stored item is dropped
    #[serde(default = "default_session_timeout_ms")]
    pub session_timeout_ms: u64,
    /// Interval of the idle/expiry sweep
    #[serde(default = "default_check_interval_ms")]
    pub check_interval_ms: u64,
    /// Encryption key; a random per-process key is used when absent
    #[serde(default, skip_serializing)]
    pub encryption_key: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            session_timeout_ms: default_session_timeout_ms(),
            check_interval_ms: default_check_interval_ms(),
            encryption_key: None,
        }
    }
}

impl std::fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageConfig")
            .field("session_timeout_ms", &self.session_timeout_ms)
            .field("check_interval_ms", &self.check_interval_ms)
            .field(
                "encryption_key",
                &self
                    .encryption_key
                    .as_deref()
                    .map(|k| mask_sensitive_data(k, DEFAULT_VISIBLE_CHARS)),
            )
            .finish()
    }
}

impl StorageConfig {
    /// Merge storage configurations
    pub fn merge(mut self, other: Self) -> Self {
        if other.session_timeout_ms != default_session_timeout_ms() {
            self.session_timeout_ms = other.session_timeout_ms;
        }
        if other.check_interval_ms != default_check_interval_ms() {
            self.check_interval_ms = other.check_interval_ms;
        }
        if other.encryption_key.is_some() {
            self.encryption_key = other.encryption_key;
        }
        self
    }
}
