//! Error handling for the shield
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for the shield
pub type Result<T> = std::result::Result<T, ShieldError>;

/// Main error type for the shield
#[derive(Error, Debug)]
pub enum ShieldError {
    /// Request denied locally by the admission controller
    #[error("Rate limit exceeded: {reason}")]
    RateLimit {
        reason: String,
        retry_after_ms: u64,
    },

    /// Encryption failed (usually a serialization failure)
    #[error("Encryption error: {0}")]
    Encryption(String),

    /// Ciphertext malformed, tampered with, or encrypted under another key
    #[error("Decryption error: {0}")]
    Decryption(String),

    /// Other cryptographic primitive failures
    #[error("Crypto error: {0}")]
    Crypto(String),

    /// Idle session timed out; delivered through the expiry callback
    #[error("Session expired after {idle_ms}ms of inactivity")]
    SessionExpired { idle_ms: u64 },

    /// Authentication could not be (re)established
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Transport-level failure (connection, timeout, body decoding)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Non-success HTTP status surfaced by `HttpResponse::error_for_status`
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Periodic task registration errors
    #[error("Scheduler error: {0}")]
    Scheduler(String),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ShieldError {
    /// Create a rate limit error
    pub fn rate_limit(reason: impl Into<String>, retry_after_ms: u64) -> Self {
        Self::RateLimit {
            reason: reason.into(),
            retry_after_ms,
        }
    }

    /// Whether this error is a local admission denial
    pub fn is_rate_limit_error(&self) -> bool {
        matches!(self, Self::RateLimit { .. })
    }

    /// Retry hint attached to a rate limit denial
    pub fn retry_after_ms(&self) -> Option<u64> {
        match self {
            Self::RateLimit { retry_after_ms, .. } => Some(*retry_after_ms),
            _ => None,
        }
    }

    /// Whether backing off and retrying later can succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimit { .. } | Self::Transport(_) => true,
            Self::Http { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for ShieldError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}
