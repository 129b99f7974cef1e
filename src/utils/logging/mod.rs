//! Logging utilities
//!
//! This module installs the `tracing` subscriber used by the shield.

pub mod utils;

// Re-export commonly used types and functions
pub use utils::{LOG_ENV_VAR, LogLevel, init_logging, init_logging_from_env};
