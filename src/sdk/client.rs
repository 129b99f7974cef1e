//! Protected HTTP client

use super::transport::{AUTHORIZATION_HEADER, HttpRequest, HttpResponse, TokenRefresher, Transport};
use crate::core::rate_limiter::RateLimiter;
use crate::monitoring::health::HealthMonitor;
use crate::storage::secure::AuthStore;
use crate::utils::error::{Result, ShieldError};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

const UNAUTHORIZED: u16 = 401;

/// Wraps a [`Transport`] with admission control, bearer auth, health
/// reporting and a single token refresh on 401.
#[derive(Debug, Clone)]
pub struct ProtectedClient {
    transport: Arc<dyn Transport>,
    refresher: Option<Arc<dyn TokenRefresher>>,
    rate_limiter: Arc<RateLimiter>,
    health: Arc<HealthMonitor>,
    auth: AuthStore,
}

impl ProtectedClient {
    pub fn new(
        transport: Arc<dyn Transport>,
        rate_limiter: Arc<RateLimiter>,
        health: Arc<HealthMonitor>,
        auth: AuthStore,
    ) -> Self {
        Self {
            transport,
            refresher: None,
            rate_limiter,
            health,
            auth,
        }
    }

    /// Enable refresh-and-retry on 401 responses
    pub fn with_refresher(mut self, refresher: Arc<dyn TokenRefresher>) -> Self {
        self.refresher = Some(refresher);
        self
    }

    pub fn auth(&self) -> &AuthStore {
        &self.auth
    }

    /// Send a request.
    ///
    /// A denied admission fails with [`ShieldError::RateLimit`] before any
    /// I/O. Non-2xx responses fail with [`ShieldError::Http`]. A 401 is
    /// retried once after refreshing tokens; if that is impossible or fails,
    /// auth state is cleared and [`ShieldError::Unauthorized`] is returned.
    pub async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let response = self.dispatch(&request).await?;
        if response.status != UNAUTHORIZED {
            return response.error_for_status();
        }
        if request.retried {
            return Err(self.force_logout("request rejected after token refresh"));
        }

        self.refresh_tokens().await?;

        let retry = HttpRequest {
            retried: true,
            ..request
        };
        let response = self.dispatch(&retry).await?;
        if response.status == UNAUTHORIZED {
            return Err(self.force_logout("request rejected after token refresh"));
        }
        response.error_for_status()
    }

    /// Admission, bearer token, transport and health reporting for one attempt
    async fn dispatch(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let endpoint = request.endpoint();
        let decision = self.rate_limiter.check_and_record(endpoint);
        if !decision.allowed {
            warn!(
                endpoint = endpoint,
                retry_after_ms = decision.retry_after_ms.unwrap_or(0),
                "Request denied by rate limiter"
            );
        }
        decision.into_result()?;

        let mut outgoing = request.clone();
        if let Some(token) = self.auth.access_token() {
            outgoing
                .headers
                .insert(AUTHORIZATION_HEADER.to_string(), format!("Bearer {}", token));
        }

        if let Some(body) = request.masked_body() {
            debug!(method = %request.method, path = %request.path, body = %body, "Sending request");
        } else {
            debug!(method = %request.method, path = %request.path, "Sending request");
        }

        let started = Instant::now();
        let result = self.transport.send(&outgoing).await;
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

        match &result {
            Ok(response) => {
                self.health.record_response_time(endpoint, elapsed_ms);
                if response.status < 400 {
                    self.health.record_success();
                } else {
                    self.health.record_error(
                        &format!("HTTP {}", response.status),
                        Some(endpoint),
                        Some(response.status),
                    );
                }
            }
            Err(e) => self.health.record_error(&e.to_string(), Some(endpoint), None),
        }
        result
    }

    async fn refresh_tokens(&self) -> Result<()> {
        let Some(refresher) = &self.refresher else {
            return Err(self.force_logout("no token refresher configured"));
        };
        let Some(refresh_token) = self.auth.refresh_token() else {
            return Err(self.force_logout("no refresh token available"));
        };

        self.rate_limiter
            .check_and_record(refresher.endpoint())
            .into_result()?;

        match refresher.refresh(&refresh_token).await {
            Ok(grant) => {
                self.auth.store_tokens(
                    &grant.access_token,
                    grant.refresh_token.as_deref(),
                    grant.expires_in,
                )?;
                info!("Access token refreshed");
                Ok(())
            }
            Err(e) => {
                warn!("Token refresh failed: {}", e);
                Err(self.force_logout("token refresh failed"))
            }
        }
    }

    fn force_logout(&self, reason: &str) -> ShieldError {
        warn!("Clearing protected state: {}", reason);
        self.auth.store().clear_all();
        ShieldError::Unauthorized(reason.to_string())
    }
}

