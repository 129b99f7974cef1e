//! Memory usage probes

#[cfg(feature = "metrics")]
use sysinfo::System;

/// Source of the host's memory usage
pub trait MemoryProbe: Send + Sync + std::fmt::Debug {
    /// Used memory as a percentage of the total, `None` when unknown
    fn usage_percent(&self) -> Option<f64>;
}

/// Probe reporting a fixed value
#[derive(Debug, Clone, Copy)]
pub struct FixedMemoryProbe(pub f64);

impl MemoryProbe for FixedMemoryProbe {
    fn usage_percent(&self) -> Option<f64> {
        Some(self.0)
    }
}

/// System memory usage read through `sysinfo`
#[cfg(feature = "metrics")]
#[derive(Debug)]
pub struct SysinfoMemoryProbe {
    system: parking_lot::Mutex<System>,
}

#[cfg(feature = "metrics")]
impl SysinfoMemoryProbe {
    pub fn new() -> Self {
        Self {
            system: parking_lot::Mutex::new(System::new()),
        }
    }
}

#[cfg(feature = "metrics")]
impl Default for SysinfoMemoryProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "metrics")]
impl MemoryProbe for SysinfoMemoryProbe {
    fn usage_percent(&self) -> Option<f64> {
        let mut system = self.system.lock();
        system.refresh_memory();
        let total = system.total_memory();
        if total == 0 {
            return None;
        }
        Some(system.used_memory() as f64 / total as f64 * 100.0)
    }
}
