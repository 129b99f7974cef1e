//! Token and user storage for authenticated sessions

use super::store::{SecureStore, SetOptions};
use crate::utils::error::{Result, ShieldError};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, warn};

pub const ACCESS_TOKEN_KEY: &str = "auth.access_token";
pub const REFRESH_TOKEN_KEY: &str = "auth.refresh_token";
pub const USER_KEY: &str = "auth.user";

/// Refresh tokens are kept for 7 days
pub const REFRESH_TOKEN_TTL_MS: u64 = 7 * 24 * 60 * 60 * 1000;

/// Fixed keys and lifetimes for auth state on top of a [`SecureStore`].
///
/// Everything is encrypted. Entries that fail to decrypt are removed and
/// reported as absent.
#[derive(Debug, Clone)]
pub struct AuthStore {
    store: Arc<SecureStore>,
}

impl AuthStore {
    pub fn new(store: Arc<SecureStore>) -> Self {
        Self { store }
    }

    /// The underlying store
    pub fn store(&self) -> &Arc<SecureStore> {
        &self.store
    }

    /// Store tokens from a login or refresh.
    ///
    /// `expires_in_secs` is the server-declared access token lifetime; 0
    /// stores the token without a TTL. A missing refresh token keeps the
    /// current one.
    pub fn store_tokens(
        &self,
        access_token: &str,
        refresh_token: Option<&str>,
        expires_in_secs: u64,
    ) -> Result<()> {
        self.store.set_str(
            ACCESS_TOKEN_KEY,
            access_token,
            SetOptions::encrypted().with_ttl(expires_in_secs.saturating_mul(1000)),
        )?;
        if let Some(refresh_token) = refresh_token {
            self.store.set_str(
                REFRESH_TOKEN_KEY,
                refresh_token,
                SetOptions::encrypted().with_ttl(REFRESH_TOKEN_TTL_MS),
            )?;
        }
        debug!("Stored auth tokens");
        Ok(())
    }

    pub fn access_token(&self) -> Option<String> {
        self.read(ACCESS_TOKEN_KEY, |key| self.store.get_string(key))
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.read(REFRESH_TOKEN_KEY, |key| self.store.get_string(key))
    }

    pub fn set_user<T: Serialize + ?Sized>(&self, user: &T) -> Result<()> {
        self.store.set(USER_KEY, user, SetOptions::encrypted())
    }

    pub fn user<T: DeserializeOwned>(&self) -> Option<T> {
        self.read(USER_KEY, |key| self.store.get_as(key))
    }

    /// Access token and user record are both present
    pub fn is_authenticated(&self) -> bool {
        self.access_token().is_some() && self.user::<serde_json::Value>().is_some()
    }

    /// Remove every auth entry
    pub fn clear(&self) {
        for key in [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_KEY] {
            self.store.remove(key);
        }
        debug!("Cleared auth state");
    }

    fn read<T, F>(&self, key: &str, get: F) -> Option<T>
    where
        F: FnOnce(&str) -> Result<Option<T>>,
    {
        match get(key) {
            Ok(value) => value,
            Err(e @ (ShieldError::Decryption(_) | ShieldError::Serialization(_))) => {
                warn!("Discarding unreadable {}: {}", key, e);
                self.store.remove(key);
                None
            }
            Err(e) => {
                warn!("Failed to read {}: {}", key, e);
                None
            }
        }
    }
}
