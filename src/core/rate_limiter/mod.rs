//! Client-side admission control
//!
//! Sliding window limits per endpoint key, a global per-second ceiling
//! and temporary blocks once either is exceeded.

mod limiter;
mod types;


// Re-export public types
pub use crate::config::models::rate_limit::{EndpointPolicy, EndpointRule};
pub use limiter::RateLimiter;
pub use types::{AdmissionDecision, BlockEntry, GLOBAL_BLOCK_KEY, RateLimitStatus};
