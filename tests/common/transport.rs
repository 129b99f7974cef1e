//! Scripted transport doubles

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use client_shield::{HttpRequest, HttpResponse, Result, ShieldError, TokenGrant, TokenRefresher, Transport};
use parking_lot::Mutex;
use serde_json::json;

/// Replays queued responses in order; answers `200 {}` once the script runs out
#[derive(Debug, Default)]
pub struct MockTransport {
    script: Mutex<VecDeque<Result<HttpResponse>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, status: u16, body: serde_json::Value) -> Self {
        self.script
            .lock()
            .push_back(Ok(HttpResponse::new(status, body)));
        self
    }

    pub fn fail(self, message: &str) -> Self {
        self.script
            .lock()
            .push_back(Err(ShieldError::Transport(message.to_string())));
        self
    }

    /// Every request that reached the transport
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse> {
        self.requests.lock().push(request.clone());
        self.script
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(HttpResponse::new(200, json!({}))))
    }
}

/// Refresher returning a fixed grant, or failing when none is set
#[derive(Debug)]
pub struct MockRefresher {
    grant: Option<TokenGrant>,
    calls: AtomicUsize,
}

impl MockRefresher {
    pub fn granting(access_token: &str, refresh_token: Option<&str>) -> Self {
        Self {
            grant: Some(TokenGrant {
                access_token: access_token.to_string(),
                refresh_token: refresh_token.map(str::to_string),
                expires_in: 3600,
            }),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            grant: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenRefresher for MockRefresher {
    async fn refresh(&self, _refresh_token: &str) -> Result<TokenGrant> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.grant.clone().ok_or_else(|| ShieldError::Http {
            status: 401,
            message: "refresh token revoked".to_string(),
        })
    }
}
