//! Protected store
//!
//! [`SecureStore`] keeps values in memory, optionally encrypted, with a
//! per-item TTL checked on read and an idle-session timeout checked on a
//! periodic tick. [`AuthStore`] layers the token and user keys on top.

mod auth;
mod session;
mod store;


pub use auth::{ACCESS_TOKEN_KEY, AuthStore, REFRESH_TOKEN_KEY, REFRESH_TOKEN_TTL_MS, USER_KEY};
pub use session::SessionState;
pub use store::{SecureStore, SessionExpiredCallback, SetOptions};
