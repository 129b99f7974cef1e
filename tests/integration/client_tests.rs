//! Protected client integration tests
//!
//! Covers admission before I/O, bearer auth, health reporting and the
//! single refresh-and-retry on 401.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::common::{MockRefresher, MockTransport, test_context};
    use client_shield::sdk::AUTHORIZATION_HEADER;
    use client_shield::{EndpointPolicy, HttpRequest, HttpTokenRefresher, SetOptions, ShieldError};
    use serde_json::json;

    fn bearer(request: &HttpRequest) -> Option<&str> {
        request.headers.get(AUTHORIZATION_HEADER).map(String::as_str)
    }

    // ==================== Happy Path ====================

    #[tokio::test]
    async fn test_bearer_token_attached() {
        let (ctx, _clock) = test_context();
        ctx.auth().store_tokens("access-1", Some("refresh-1"), 3600).unwrap();

        let transport = Arc::new(MockTransport::new().respond(200, json!({"ok": true})));
        let client = ctx.client(transport.clone());

        let response = client
            .send(HttpRequest::get("/api/courses?page=2"))
            .await
            .unwrap();
        assert_eq!(response.body["ok"], true);

        let sent = transport.requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(bearer(&sent[0]), Some("Bearer access-1"));
        assert_eq!(sent[0].path, "/api/courses?page=2");
        assert_eq!(ctx.rate_limiter().status("/api/courses").requests_in_window, 1);
        assert_eq!(ctx.health().metrics().successful_requests, 1);
    }

    #[tokio::test]
    async fn test_anonymous_request_has_no_auth_header() {
        let (ctx, _clock) = test_context();
        let transport = Arc::new(MockTransport::new());
        let client = ctx.client(transport.clone());

        client.send(HttpRequest::get("/api/public")).await.unwrap();
        assert_eq!(bearer(&transport.requests()[0]), None);
    }

    // ==================== Admission ====================

    #[tokio::test]
    async fn test_denied_request_never_reaches_transport() {
        let (ctx, clock) = test_context();
        ctx.rate_limiter()
            .set_endpoint_limit("/api/data", EndpointPolicy::new(2, 60_000, 30_000));
        let transport = Arc::new(MockTransport::new());
        let client = ctx.client(transport.clone());

        for _ in 0..2 {
            client.send(HttpRequest::get("/api/data")).await.unwrap();
            clock.advance_ms(200);
        }
        let err = client.send(HttpRequest::get("/api/data")).await.unwrap_err();

        assert!(err.is_rate_limit_error());
        assert_eq!(err.retry_after_ms(), Some(30_000));
        assert_eq!(transport.request_count(), 2);
    }

    // ==================== Error Reporting ====================

    #[tokio::test]
    async fn test_server_error_reported_to_health() {
        let (ctx, _clock) = test_context();
        let transport =
            Arc::new(MockTransport::new().respond(503, json!({"message": "maintenance"})));
        let client = ctx.client(transport);

        let err = client.send(HttpRequest::get("/api/data")).await.unwrap_err();
        match err {
            ShieldError::Http { status, message } => {
                assert_eq!(status, 503);
                assert_eq!(message, "maintenance");
            }
            other => panic!("expected HTTP error, got {:?}", other),
        }
        assert!(ShieldError::Http {
            status: 503,
            message: String::new()
        }
        .is_retryable());

        let metrics = ctx.health().metrics();
        assert_eq!(metrics.error_rate, 1.0);
        assert_eq!(metrics.failed_requests, 1);
    }

    #[tokio::test]
    async fn test_transport_failure_reported_to_health() {
        let (ctx, _clock) = test_context();
        let transport = Arc::new(MockTransport::new().fail("connection reset"));
        let client = ctx.client(transport);

        let err = client.send(HttpRequest::get("/api/data")).await.unwrap_err();
        assert!(matches!(err, ShieldError::Transport(_)));

        let metrics = ctx.health().metrics();
        assert_eq!(metrics.error_rate, 1.0);
        assert_eq!(metrics.failed_requests, 0);
    }

    // ==================== 401 Handling ====================

    #[tokio::test]
    async fn test_refresh_and_retry_on_401() {
        let (ctx, _clock) = test_context();
        ctx.auth().store_tokens("stale", Some("refresh-1"), 3600).unwrap();

        let transport = Arc::new(
            MockTransport::new()
                .respond(401, json!({"error": "token expired"}))
                .respond(200, json!({"items": []})),
        );
        let refresher = Arc::new(MockRefresher::granting("fresh", Some("refresh-2")));
        let client = ctx.client(transport.clone()).with_refresher(refresher.clone());

        let response = client.send(HttpRequest::get("/api/courses")).await.unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(refresher.calls(), 1);

        let sent = transport.requests();
        assert_eq!(sent.len(), 2);
        assert_eq!(bearer(&sent[0]), Some("Bearer stale"));
        assert_eq!(bearer(&sent[1]), Some("Bearer fresh"));
        assert!(!sent[0].retried);
        assert!(sent[1].retried);

        assert_eq!(ctx.auth().access_token().as_deref(), Some("fresh"));
        assert_eq!(ctx.auth().refresh_token().as_deref(), Some("refresh-2"));
        assert_eq!(
            ctx.rate_limiter()
                .status("/api/traffic-auth/refresh")
                .requests_in_window,
            1
        );
    }

    #[tokio::test]
    async fn test_second_401_logs_out() {
        let (ctx, _clock) = test_context();
        ctx.auth().store_tokens("stale", Some("refresh-1"), 3600).unwrap();
        ctx.auth().set_user(&json!({"id": 1})).unwrap();

        let transport = Arc::new(
            MockTransport::new()
                .respond(401, json!({}))
                .respond(401, json!({})),
        );
        let refresher = Arc::new(MockRefresher::granting("fresh", None));
        let client = ctx.client(transport.clone()).with_refresher(refresher);

        let err = client.send(HttpRequest::get("/api/courses")).await.unwrap_err();
        assert!(matches!(err, ShieldError::Unauthorized(_)));
        assert_eq!(transport.request_count(), 2);
        assert!(!ctx.auth().is_authenticated());
        assert_eq!(ctx.auth().refresh_token(), None);
        assert!(ctx.store().is_empty());
    }

    #[tokio::test]
    async fn test_failed_refresh_logs_out() {
        let (ctx, _clock) = test_context();
        ctx.auth().store_tokens("stale", Some("revoked"), 3600).unwrap();
        ctx.store()
            .set_str("cart", "[3, 7]", SetOptions::encrypted())
            .unwrap();

        let transport = Arc::new(MockTransport::new().respond(401, json!({})));
        let refresher = Arc::new(MockRefresher::failing());
        let client = ctx.client(transport.clone()).with_refresher(refresher.clone());

        let err = client.send(HttpRequest::get("/api/courses")).await.unwrap_err();
        assert!(matches!(err, ShieldError::Unauthorized(_)));
        assert_eq!(refresher.calls(), 1);
        assert_eq!(transport.request_count(), 1);
        assert_eq!(ctx.auth().access_token(), None);
        assert!(!ctx.store().has("cart"));
        assert!(ctx.store().is_empty());
    }

    #[tokio::test]
    async fn test_401_without_refresh_token_logs_out() {
        let (ctx, _clock) = test_context();
        ctx.auth().store_tokens("stale", None, 3600).unwrap();

        let transport = Arc::new(MockTransport::new().respond(401, json!({})));
        let refresher = Arc::new(MockRefresher::granting("fresh", None));
        let client = ctx.client(transport).with_refresher(refresher.clone());

        let err = client.send(HttpRequest::get("/api/courses")).await.unwrap_err();
        assert!(matches!(err, ShieldError::Unauthorized(_)));
        assert_eq!(refresher.calls(), 0);
        assert_eq!(ctx.auth().access_token(), None);
        assert!(ctx.store().is_empty());
    }

    #[tokio::test]
    async fn test_401_without_refresher_logs_out() {
        let (ctx, _clock) = test_context();
        ctx.auth().store_tokens("stale", Some("refresh-1"), 3600).unwrap();

        let transport = Arc::new(MockTransport::new().respond(401, json!({})));
        let client = ctx.client(transport);

        let err = client.send(HttpRequest::get("/api/courses")).await.unwrap_err();
        assert!(matches!(err, ShieldError::Unauthorized(_)));
        assert_eq!(ctx.auth().refresh_token(), None);
        assert!(ctx.store().is_empty());
    }

    #[tokio::test]
    async fn test_http_refresher_posts_refresh_token() {
        let (ctx, _clock) = test_context();
        ctx.auth().store_tokens("stale", Some("refresh-1"), 3600).unwrap();

        let auth_transport = Arc::new(MockTransport::new().respond(
            200,
            json!({"access_token": "fresh", "refresh_token": "refresh-2", "expires_in": 60}),
        ));
        let api_transport = Arc::new(MockTransport::new().respond(401, json!({})));
        let client = ctx
            .client(api_transport.clone())
            .with_refresher(Arc::new(HttpTokenRefresher::new(auth_transport.clone())));

        client.send(HttpRequest::get("/api/courses")).await.unwrap();

        let refresh_calls = auth_transport.requests();
        assert_eq!(refresh_calls.len(), 1);
        assert_eq!(refresh_calls[0].path, "/api/traffic-auth/refresh");
        assert_eq!(
            refresh_calls[0].body,
            Some(json!({"refresh_token": "refresh-1"}))
        );
        assert_eq!(api_transport.request_count(), 2);
        assert_eq!(ctx.auth().access_token().as_deref(), Some("fresh"));
    }
}
