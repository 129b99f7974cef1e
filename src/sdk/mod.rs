//! Transport integration
//!
//! [`ProtectedClient`] applies the shield around any [`Transport`];
//! [`ReqwestTransport`] is the HTTP implementation.

mod client;
mod reqwest_transport;
mod transport;

pub use client::ProtectedClient;
pub use reqwest_transport::{DEFAULT_TIMEOUT, ReqwestTransport};
pub use transport::{
    AUTHORIZATION_HEADER, DEFAULT_REFRESH_ENDPOINT, HttpRequest, HttpResponse, HttpTokenRefresher,
    TokenGrant, TokenRefresher, Transport,
};
