//! CSRF tokens bound to their creation time

use super::crypto::{decrypt, encrypt_value, generate_secure_token};
use crate::core::clock::Clock;
use crate::utils::error::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

const CSRF_NONCE_BYTES: usize = 16;

#[derive(Debug, Serialize, Deserialize)]
struct CsrfPayload {
    nonce: String,
    ts: u64,
}

/// Issues and verifies encrypted `{nonce, timestamp}` CSRF tokens
#[derive(Clone)]
pub struct CsrfGuard {
    key: Vec<u8>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for CsrfGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CsrfGuard")
            .field("key", &"<redacted>")
            .field("clock", &self.clock)
            .finish()
    }
}

impl CsrfGuard {
    /// Create a guard encrypting under `key`
    pub fn new(key: impl Into<Vec<u8>>, clock: Arc<dyn Clock>) -> Self {
        Self {
            key: key.into(),
            clock,
        }
    }

    /// Generate a token stamped with the current time
    pub fn generate(&self) -> Result<String> {
        let payload = CsrfPayload {
            nonce: generate_secure_token(CSRF_NONCE_BYTES),
            ts: self.clock.now_ms(),
        };
        encrypt_value(&payload, &self.key)
    }

    /// True iff the token decrypts under this guard's key and is younger
    /// than `max_age_ms`. Never fails: any error verifies as `false`.
    pub fn verify(&self, token: &str, max_age_ms: u64) -> bool {
        let payload = match decrypt(token, &self.key)
            .ok()
            .and_then(|plain| serde_json::from_str::<CsrfPayload>(&plain).ok())
        {
            Some(payload) => payload,
            None => {
                debug!("Rejected malformed CSRF token");
                return false;
            }
        };

        let now = self.clock.now_ms();
        // Tokens from the future are as suspicious as stale ones.
        if payload.ts > now {
            return false;
        }
        now - payload.ts < max_age_ms
    }
}
