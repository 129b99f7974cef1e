//! Shield context
//!
//! Owns one instance of every component and wires them to a shared clock.
//! Nothing here is global: construct a context, [`ShieldContext::start`] it
//! with a scheduler, and [`ShieldContext::destroy`] it when done.

use crate::config::ShieldConfig;
use crate::core::clock::{Clock, SystemClock};
use crate::core::rate_limiter::RateLimiter;
use crate::core::scheduler::Scheduler;
use crate::monitoring::health::{HealthMonitor, MemoryProbe};
use crate::sdk::{ProtectedClient, Transport};
use crate::storage::secure::{AuthStore, SecureStore};
use crate::utils::auth::crypto::generate_secure_token;
use crate::utils::auth::csrf::CsrfGuard;
use crate::utils::error::Result;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info};

/// Every shield component, sharing one configuration and clock
#[derive(Debug)]
pub struct ShieldContext {
    config: ShieldConfig,
    clock: Arc<dyn Clock>,
    rate_limiter: Arc<RateLimiter>,
    health: Arc<HealthMonitor>,
    store: Arc<SecureStore>,
    auth: AuthStore,
    csrf: CsrfGuard,
    destroyed: AtomicBool,
}

impl ShieldContext {
    /// Build a context on the system clock
    pub fn new(config: ShieldConfig) -> Result<Self> {
        Self::with_clock(config, SystemClock::shared())
    }

    /// Build a context on `clock`
    pub fn with_clock(config: ShieldConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        Self::build(config, clock, None)
    }

    /// Build a context whose health monitor samples memory from `probe`
    pub fn with_memory_probe(
        config: ShieldConfig,
        clock: Arc<dyn Clock>,
        probe: Arc<dyn MemoryProbe>,
    ) -> Result<Self> {
        Self::build(config, clock, Some(probe))
    }

    fn build(
        config: ShieldConfig,
        clock: Arc<dyn Clock>,
        probe: Option<Arc<dyn MemoryProbe>>,
    ) -> Result<Self> {
        config.validate()?;

        let rate_limiter = Arc::new(RateLimiter::new(config.rate_limit.clone(), clock.clone()));

        let mut health = HealthMonitor::new(config.health.clone(), clock.clone());
        if let Some(probe) = probe {
            health = health.with_memory_probe(probe);
        }
        let health = Arc::new(health);

        let store = Arc::new(SecureStore::new(config.storage.clone(), clock.clone()));
        let auth = AuthStore::new(store.clone());

        let csrf_key = match &config.storage.encryption_key {
            Some(key) => key.clone().into_bytes(),
            None => generate_secure_token(32).into_bytes(),
        };
        let csrf = CsrfGuard::new(csrf_key, clock.clone());

        debug!("Shield context created");
        Ok(Self {
            config,
            clock,
            rate_limiter,
            health,
            store,
            auth,
            csrf,
            destroyed: AtomicBool::new(false),
        })
    }

    /// Register every periodic task with `scheduler`
    pub fn start(&self, scheduler: &dyn Scheduler) -> Result<()> {
        self.rate_limiter.start_sweeper(scheduler)?;
        self.health.start(scheduler)?;
        self.store.start(scheduler)?;
        self.destroyed.store(false, Ordering::Release);
        info!("Shield started");
        Ok(())
    }

    /// Cancel every periodic task. Safe to call repeatedly.
    pub fn destroy(&self) {
        if self.destroyed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.rate_limiter.destroy();
        self.health.destroy();
        self.store.destroy();
        info!("Shield stopped");
    }

    /// A protected client sending through `transport`
    pub fn client(&self, transport: Arc<dyn Transport>) -> ProtectedClient {
        ProtectedClient::new(
            transport,
            self.rate_limiter.clone(),
            self.health.clone(),
            self.auth.clone(),
        )
    }

    pub fn config(&self) -> &ShieldConfig {
        &self.config
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn rate_limiter(&self) -> &Arc<RateLimiter> {
        &self.rate_limiter
    }

    pub fn health(&self) -> &Arc<HealthMonitor> {
        &self.health
    }

    pub fn store(&self) -> &Arc<SecureStore> {
        &self.store
    }

    pub fn auth(&self) -> &AuthStore {
        &self.auth
    }

    pub fn csrf(&self) -> &CsrfGuard {
        &self.csrf
    }
}

impl Drop for ShieldContext {
    fn drop(&mut self) {
        self.destroy();
    }
}
