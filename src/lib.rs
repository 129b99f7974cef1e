//! # Client Shield
//!
//! A client-resident security and resilience layer for outbound API traffic.
//!
//! ## Features
//!
//! - **Admission Control**: sliding-window per-endpoint limits, a global
//!   per-second ceiling and temporary endpoint blocks
//! - **Health Aggregation**: error and latency samples over a trailing
//!   minute, threshold alerts with de-duplication
//! - **Protected Storage**: AES-256-GCM encrypted items with TTLs and an
//!   idle session timeout that wipes everything
//! - **Transport Integration**: bearer auth, admission before I/O, health
//!   reporting and a single refresh-and-retry on 401
//! - **Crypto Primitives**: encryption, HMAC signatures, PBKDF2 password
//!   hashing, secure tokens, CSRF tokens and data masking
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use client_shield::sdk::DEFAULT_TIMEOUT;
//! use client_shield::{HttpRequest, ReqwestTransport, ShieldConfig, ShieldContext, TokioScheduler};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ShieldConfig::from_env()?;
//!     client_shield::init_logging_from_env(config.log_level);
//!     let shield = ShieldContext::new(config)?;
//!     shield.start(&TokioScheduler::new())?;
//!
//!     let transport = ReqwestTransport::new("https://api.example.com", DEFAULT_TIMEOUT)?;
//!     let client = shield.client(Arc::new(transport));
//!
//!     let response = client.send(HttpRequest::get("/api/traffic-analytics/summary")).await?;
//!     println!("status: {}", response.status);
//!
//!     shield.destroy();
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_inception)]

pub mod config;
pub mod core;
pub mod monitoring;
pub mod sdk;
pub mod storage;
pub mod utils;

// Re-export main types
pub use config::ShieldConfig;
pub use utils::error::{Result, ShieldError};

pub use core::clock::{Clock, MockClock, SystemClock};
pub use core::context::ShieldContext;
pub use core::rate_limiter::{AdmissionDecision, EndpointPolicy, RateLimitStatus, RateLimiter};
pub use core::scheduler::{ManualScheduler, Scheduler, TaskHandle, TokioScheduler};

pub use monitoring::{Alert, AlertKind, AlertSeverity, HealthMetrics, HealthMonitor, HealthStatus};

pub use sdk::{
    HttpRequest, HttpResponse, HttpTokenRefresher, ProtectedClient, ReqwestTransport, TokenGrant,
    TokenRefresher, Transport,
};

pub use storage::{AuthStore, SecureStore, SessionState, SetOptions};

pub use utils::auth::CsrfGuard;
pub use utils::logging::{init_logging, init_logging_from_env};

// Version information
/// Current version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Name of the crate
pub const NAME: &str = env!("CARGO_PKG_NAME");
