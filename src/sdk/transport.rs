//! Transport boundary
//!
//! The shield never talks to the network itself; it wraps a [`Transport`].

use crate::utils::auth::crypto::mask_sensitive_fields;
use crate::utils::error::{Result, ShieldError};
use async_trait::async_trait;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const AUTHORIZATION_HEADER: &str = "Authorization";

/// An outbound request relative to the transport's base URL
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    /// Path plus optional query, e.g. `/api/courses?page=2`
    pub path: String,
    pub headers: BTreeMap<String, String>,
    pub body: Option<serde_json::Value>,
    /// Set on the single retry that follows a token refresh
    pub retried: bool,
}

impl HttpRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: BTreeMap::new(),
            body: None,
            retried: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>, body: serde_json::Value) -> Self {
        Self::new(Method::POST, path).with_body(body)
    }

    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Path without the query string; used as the admission key
    pub fn endpoint(&self) -> &str {
        self.path
            .split_once('?')
            .map_or(self.path.as_str(), |(path, _)| path)
    }

    /// Body with sensitive fields masked, for logging
    pub fn masked_body(&self) -> Option<serde_json::Value> {
        self.body.as_ref().map(mask_sensitive_fields)
    }
}

/// A completed HTTP exchange
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: serde_json::Value,
}

impl HttpResponse {
    pub fn new(status: u16, body: serde_json::Value) -> Self {
        Self { status, body }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Turn a non-2xx response into [`ShieldError::Http`]
    pub fn error_for_status(self) -> Result<Self> {
        if self.is_success() {
            return Ok(self);
        }
        let message = self
            .body
            .get("message")
            .or_else(|| self.body.get("error"))
            .and_then(|m| m.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| format!("HTTP {}", self.status));
        Err(ShieldError::Http {
            status: self.status,
            message,
        })
    }
}

/// Sends requests over the wire
#[async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse> {
        (**self).send(request).await
    }
}

/// Tokens returned by a login or refresh call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Access token lifetime in seconds
    #[serde(default)]
    pub expires_in: u64,
}

/// Exchanges a refresh token for new tokens
#[async_trait]
pub trait TokenRefresher: Send + Sync + std::fmt::Debug {
    /// Endpoint key the refresh call is admitted under
    fn endpoint(&self) -> &str {
        DEFAULT_REFRESH_ENDPOINT
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant>;
}

pub const DEFAULT_REFRESH_ENDPOINT: &str = "/api/traffic-auth/refresh";

/// Refreshes tokens by POSTing `{"refresh_token": ...}` through a transport
#[derive(Debug, Clone)]
pub struct HttpTokenRefresher<T> {
    transport: T,
    endpoint: String,
}

impl<T: Transport> HttpTokenRefresher<T> {
    pub fn new(transport: T) -> Self {
        Self::with_endpoint(transport, DEFAULT_REFRESH_ENDPOINT)
    }

    pub fn with_endpoint(transport: T, endpoint: impl Into<String>) -> Self {
        Self {
            transport,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl<T: Transport> TokenRefresher for HttpTokenRefresher<T> {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant> {
        let request = HttpRequest::post(
            self.endpoint.clone(),
            serde_json::json!({ "refresh_token": refresh_token }),
        );
        let response = self.transport.send(&request).await?.error_for_status()?;
        Ok(serde_json::from_value(response.body)?)
    }
}
