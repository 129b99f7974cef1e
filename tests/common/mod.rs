//! Common test utilities for client-shield
//!
//! - [`MockTransport`]: replays scripted responses and records requests
//! - [`MockRefresher`]: token refresher with a scripted outcome
//! - Context fixtures driven by a [`MockClock`]

pub mod transport;

pub use transport::{MockRefresher, MockTransport};

use std::sync::Arc;

use client_shield::{ManualScheduler, MockClock, ShieldConfig, ShieldContext};

/// A context with default configuration on a fresh virtual clock
pub fn test_context() -> (ShieldContext, MockClock) {
    context_with(ShieldConfig::default())
}

/// A context with `config` on a fresh virtual clock
pub fn context_with(config: ShieldConfig) -> (ShieldContext, MockClock) {
    let clock = MockClock::default();
    let ctx = ShieldContext::with_clock(config, Arc::new(clock.clone()))
        .expect("test configuration should be valid");
    (ctx, clock)
}

/// A started context plus the scheduler driving its periodic tasks
pub fn started_context(config: ShieldConfig) -> (ShieldContext, ManualScheduler) {
    let (ctx, clock) = context_with(config);
    let scheduler = ManualScheduler::new(clock);
    ctx.start(&scheduler).expect("scheduler should accept tasks");
    (ctx, scheduler)
}
