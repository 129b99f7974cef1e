//! Health aggregation
//!
//! [`HealthMonitor`] owns the samples, counters and alerts. Memory usage
//! comes from an optional [`MemoryProbe`].

mod monitor;
mod probe;
mod types;


// Re-export public types
pub use monitor::{AlertCallback, HealthMonitor};
#[cfg(feature = "metrics")]
pub use probe::SysinfoMemoryProbe;
pub use probe::{FixedMemoryProbe, MemoryProbe};
pub use types::{ErrorSample, LatencySample};
