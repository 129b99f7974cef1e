//! Utility modules for the shield
//!
//! - **auth**: cryptographic primitives and CSRF protection
//! - **error**: the crate-wide error type
//! - **logging**: `tracing` subscriber setup

pub mod auth;
pub mod error;
pub mod logging;

pub use error::{Result, ShieldError};
pub use logging::LogLevel;

/// Format a millisecond duration the way uptime is displayed:
/// `1d 2h`, `3h 4m`, `5m 6s` or `7s`.
pub fn format_uptime(ms: u64) -> String {
    let seconds = ms / 1000;
    let minutes = seconds / 60;
    let hours = minutes / 60;
    let days = hours / 24;

    if days > 0 {
        format!("{}d {}h", days, hours % 24)
    } else if hours > 0 {
        format!("{}h {}m", hours, minutes % 60)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds % 60)
    } else {
        format!("{}s", seconds)
    }
}
