//! Core functionality for the shield
//!
//! Time and scheduling ports, the admission controller, and the context
//! that wires every component together.

pub mod clock;
pub mod context;
pub mod rate_limiter;
pub mod scheduler;

pub use clock::{Clock, MockClock, SystemClock};
pub use context::ShieldContext;
pub use rate_limiter::{AdmissionDecision, RateLimiter};
pub use scheduler::{ManualScheduler, PeriodicTask, Scheduler, TaskHandle, TokioScheduler};
