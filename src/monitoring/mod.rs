//! Client health monitoring
//!
//! Error and latency samples are aggregated over a trailing window and
//! compared against thresholds on a periodic tick, raising de-duplicated
//! alerts.

pub mod health;
mod types;

// Re-export public types
pub use health::{AlertCallback, HealthMonitor, MemoryProbe};
#[cfg(feature = "metrics")]
pub use health::SysinfoMemoryProbe;
pub use types::{Alert, AlertKind, AlertSeverity, HealthMetrics, HealthStatus};
