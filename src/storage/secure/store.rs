//! In-memory protected store

use super::session::SessionState;
use crate::config::models::storage::StorageConfig;
use crate::core::clock::Clock;
use crate::core::scheduler::{Scheduler, TaskHandle};
use crate::utils::auth::crypto::{self, parse_structured};
use crate::utils::error::{Result, ShieldError};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Invoked once each time the idle session times out
pub type SessionExpiredCallback = Arc<dyn Fn(&ShieldError) + Send + Sync>;

/// Options for [`SecureStore::set`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetOptions {
    /// Lifetime in milliseconds, 0 for none
    pub ttl_ms: u64,
    /// Encrypt the value at rest
    pub encrypt: bool,
}

impl SetOptions {
    pub fn encrypted() -> Self {
        Self {
            ttl_ms: 0,
            encrypt: true,
        }
    }

    pub fn with_ttl(mut self, ttl_ms: u64) -> Self {
        self.ttl_ms = ttl_ms;
        self
    }
}

#[derive(Clone)]
pub(super) struct StoredItem {
    pub(super) value: String,
    /// Absolute expiry, 0 for none
    pub(super) expires_at_ms: u64,
    pub(super) encrypted: bool,
}

impl StoredItem {
    fn is_expired(&self, now_ms: u64) -> bool {
        self.expires_at_ms != 0 && now_ms >= self.expires_at_ms
    }
}

pub(super) struct StoreState {
    pub(super) items: HashMap<String, StoredItem>,
    pub(super) session: SessionState,
}

/// Ephemeral key/value store with encryption, TTLs and idle timeout
pub struct SecureStore {
    clock: Arc<dyn Clock>,
    key: Vec<u8>,
    config: StorageConfig,
    pub(super) state: Mutex<StoreState>,
    on_expired: RwLock<Option<SessionExpiredCallback>>,
    task: Mutex<Option<TaskHandle>>,
}

impl std::fmt::Debug for SecureStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("SecureStore")
            .field("items", &state.items.len())
            .field("session", &state.session)
            .field("config", &self.config)
            .finish()
    }
}

impl SecureStore {
    /// Create a store. Without a configured key a random per-process key is used.
    pub fn new(config: StorageConfig, clock: Arc<dyn Clock>) -> Self {
        let key = match &config.encryption_key {
            Some(key) => key.as_bytes().to_vec(),
            None => {
                debug!("No storage encryption key configured, generating one");
                crypto::generate_secure_token(32).into_bytes()
            }
        };

        Self {
            clock,
            key,
            config,
            state: Mutex::new(StoreState {
                items: HashMap::new(),
                session: SessionState::Expired,
            }),
            on_expired: RwLock::new(None),
            task: Mutex::new(None),
        }
    }

    /// Store a value serialized as JSON
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T, options: SetOptions) -> Result<()> {
        let raw = serde_json::to_string(value)?;
        self.set_raw(key, raw, options)
    }

    /// Store a string as-is
    pub fn set_str(&self, key: &str, value: &str, options: SetOptions) -> Result<()> {
        self.set_raw(key, value.to_string(), options)
    }

    fn set_raw(&self, key: &str, raw: String, options: SetOptions) -> Result<()> {
        let value = if options.encrypt {
            crypto::encrypt(&raw, &self.key)?
        } else {
            raw
        };

        let now = self.clock.now_ms();
        let expires_at_ms = if options.ttl_ms > 0 {
            now.saturating_add(options.ttl_ms)
        } else {
            0
        };

        let mut state = self.state.lock();
        state.items.insert(
            key.to_string(),
            StoredItem {
                value,
                expires_at_ms,
                encrypted: options.encrypt,
            },
        );
        state.session.arm(now);
        debug!(key = key, encrypted = options.encrypt, ttl_ms = options.ttl_ms, "Stored item");
        Ok(())
    }

    /// Read a value, parsing JSON with a raw string fallback
    pub fn get(&self, key: &str) -> Result<Option<serde_json::Value>> {
        Ok(self.get_string(key)?.map(parse_structured))
    }

    /// Read the stored text exactly as it was serialized
    pub fn get_string(&self, key: &str) -> Result<Option<String>> {
        let now = self.clock.now_ms();
        let Some(item) = self.live_item(key, now) else {
            return Ok(None);
        };

        if item.encrypted {
            crypto::decrypt(&item.value, &self.key).map(Some)
        } else {
            Ok(Some(item.value))
        }
    }

    /// Read and deserialize a value
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get_string(key)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Whether a live item exists under `key`
    pub fn has(&self, key: &str) -> bool {
        let now = self.clock.now_ms();
        self.live_item(key, now).is_some()
    }

    /// Clone of a live item; an expired item is deleted on the way.
    /// Counts as activity for an active session.
    fn live_item(&self, key: &str, now: u64) -> Option<StoredItem> {
        let mut state = self.state.lock();
        state.session.touch(now);
        let item = state.items.get(key)?.clone();
        if item.is_expired(now) {
            state.items.remove(key);
            debug!(key = key, "Stored item expired");
            return None;
        }
        Some(item)
    }

    pub fn remove(&self, key: &str) -> bool {
        let now = self.clock.now_ms();
        let mut state = self.state.lock();
        state.session.touch(now);
        state.items.remove(key).is_some()
    }

    pub fn clear_all(&self) {
        let now = self.clock.now_ms();
        let mut state = self.state.lock();
        state.session.touch(now);
        state.items.clear();
        debug!("Cleared protected store");
    }

    /// Number of stored items, expired ones included until purged
    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Record user activity, keeping an active session alive
    pub fn touch(&self) {
        let now = self.clock.now_ms();
        self.state.lock().session.touch(now);
    }

    pub fn session_state(&self) -> SessionState {
        self.state.lock().session
    }

    /// Delete expired items, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now_ms();
        let mut state = self.state.lock();
        let before = state.items.len();
        state.items.retain(|_, item| !item.is_expired(now));
        before - state.items.len()
    }

    /// Register the callback invoked when the idle session times out
    pub fn on_session_expired<F>(&self, callback: F)
    where
        F: Fn(&ShieldError) + Send + Sync + 'static,
    {
        *self.on_expired.write() = Some(Arc::new(callback));
    }

    /// Expire an idle session, clearing every item.
    ///
    /// Returns true only on the tick that performs the transition.
    pub fn check_session(&self) -> bool {
        let now = self.clock.now_ms();
        let idle_ms = {
            let mut state = self.state.lock();
            let Some(idle_ms) = state.session.timed_out(now, self.config.session_timeout_ms)
            else {
                return false;
            };
            state.items.clear();
            state.session = SessionState::Expired;
            idle_ms
        };

        info!("Session expired after {}ms of inactivity", idle_ms);
        let callback = self.on_expired.read().clone();
        if let Some(callback) = callback {
            callback(&ShieldError::SessionExpired { idle_ms });
        }
        true
    }

    /// Periodic work: idle-session check followed by expiry purge
    pub fn tick(&self) {
        self.check_session();
        let purged = self.purge_expired();
        if purged > 0 {
            debug!("Purged {} expired items", purged);
        }
    }

    /// Register the periodic tick with `scheduler`
    pub fn start(self: &Arc<Self>, scheduler: &dyn Scheduler) -> Result<()> {
        let store = Arc::downgrade(self);
        let handle = scheduler.register_periodic_task(
            "session-check",
            Duration::from_millis(self.config.check_interval_ms),
            Arc::new(move || {
                if let Some(store) = store.upgrade() {
                    store.tick();
                }
            }),
        )?;

        if let Some(previous) = self.task.lock().replace(handle) {
            warn!("Protected store started twice, replacing previous tick");
            previous.cancel();
        }
        Ok(())
    }

    /// Stop the periodic tick. Safe to call repeatedly.
    pub fn destroy(&self) {
        if let Some(handle) = self.task.lock().take() {
            handle.cancel();
        }
    }
}
