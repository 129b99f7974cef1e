//! Authentication and Security utilities
//!
//! This module provides the cryptographic primitives and CSRF protection.

pub mod crypto;
pub mod csrf;

// Re-export commonly used types and functions
pub use crypto::*;
pub use csrf::CsrfGuard;
