//! Clock port and adapters.
//!
//! Every component reads time through [`Clock`] so that expiry, windows and
//! idle timeouts can be driven by a virtual clock in tests.
//!
//! Time is expressed as wall-clock milliseconds since the Unix epoch because
//! CSRF tokens embed their creation time and must stay comparable across
//! process boundaries.

use std::fmt::Debug;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Port for obtaining current time.
pub trait Clock: Send + Sync + Debug {
    /// Milliseconds since the Unix epoch. Not guaranteed monotonic.
    fn now_ms(&self) -> u64;
}

/// System clock backed by `chrono::Utc::now()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    /// Create a new system clock.
    pub fn new() -> Self {
        Self
    }

    /// Shared handle, the form components take.
    pub fn shared() -> Arc<dyn Clock> {
        Arc::new(Self)
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        chrono::Utc::now().timestamp_millis().max(0) as u64
    }
}

/// Controllable clock for tests.
///
/// All clones share the same underlying time value, so advancing one clone
/// advances every component holding another.
///
/// ```
/// use client_shield::core::clock::{Clock, MockClock};
/// use std::time::Duration;
///
/// let clock = MockClock::new(1_000);
/// clock.advance(Duration::from_millis(250));
/// assert_eq!(clock.now_ms(), 1_250);
/// ```
#[derive(Debug, Clone)]
pub struct MockClock {
    current_ms: Arc<AtomicU64>,
}

impl MockClock {
    /// Create a mock clock starting at `start_ms`.
    pub fn new(start_ms: u64) -> Self {
        Self {
            current_ms: Arc::new(AtomicU64::new(start_ms)),
        }
    }

    /// Advance the clock by a duration.
    pub fn advance(&self, duration: Duration) {
        self.advance_ms(duration.as_millis() as u64);
    }

    /// Advance the clock by a number of milliseconds.
    pub fn advance_ms(&self, ms: u64) {
        self.current_ms.fetch_add(ms, Ordering::SeqCst);
    }

    /// Set the clock to a specific time.
    pub fn set_ms(&self, ms: u64) {
        self.current_ms.store(ms, Ordering::SeqCst);
    }
}

impl Default for MockClock {
    fn default() -> Self {
        // An arbitrary, realistic epoch offset (2024-01-01T00:00:00Z).
        Self::new(1_704_067_200_000)
    }
}

impl Clock for MockClock {
    fn now_ms(&self) -> u64 {
        self.current_ms.load(Ordering::SeqCst)
    }
}
