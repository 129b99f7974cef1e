//! Storage layer for the shield
//!
//! Everything here lives in process memory only; nothing survives a
//! restart.

/// Encrypted ephemeral key/value store with idle-session expiry
pub mod secure;

pub use secure::{AuthStore, SecureStore, SessionExpiredCallback, SessionState, SetOptions};
