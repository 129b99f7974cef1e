//! `reqwest` transport tests against a local mock server

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use crate::common::test_context;
    use client_shield::sdk::{DEFAULT_TIMEOUT, HttpTokenRefresher};
    use client_shield::{HttpRequest, ReqwestTransport, ShieldError, Transport};
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_sends_json_and_parses_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/notes"))
            .and(header("x-request-id", "abc"))
            .and(body_json(json!({"title": "hello"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 9})))
            .expect(1)
            .mount(&server)
            .await;

        let transport = ReqwestTransport::new(format!("{}/", server.uri()), DEFAULT_TIMEOUT).unwrap();
        let response = transport
            .send(&HttpRequest::post("/api/notes", json!({"title": "hello"})).with_header("x-request-id", "abc"))
            .await
            .unwrap();

        assert_eq!(response.status, 201);
        assert_eq!(response.body["id"], 9);
    }

    #[tokio::test]
    async fn test_plain_text_and_empty_bodies() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/text"))
            .respond_with(ResponseTemplate::new(200).set_body_string("pong"))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/item"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let transport = ReqwestTransport::new(server.uri(), DEFAULT_TIMEOUT).unwrap();

        let text = transport.send(&HttpRequest::get("text")).await.unwrap();
        assert_eq!(text.body, json!("pong"));

        let empty = transport
            .send(&HttpRequest::new(reqwest::Method::DELETE, "/item"))
            .await
            .unwrap();
        assert_eq!(empty.status, 204);
        assert!(empty.body.is_null());
    }

    #[tokio::test]
    async fn test_timeout_is_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let transport = ReqwestTransport::new(server.uri(), Duration::from_millis(50)).unwrap();
        let err = transport.send(&HttpRequest::get("/slow")).await.unwrap_err();
        assert!(matches!(err, ShieldError::Transport(_)));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_protected_client_refresh_over_http() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/courses"))
            .and(query_param("page", "1"))
            .and(header("Authorization", "Bearer stale"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": "expired"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/traffic-auth/refresh"))
            .and(body_json(json!({"refresh_token": "refresh-1"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "fresh",
                "expires_in": 3600
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/courses"))
            .and(header("Authorization", "Bearer fresh"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": [1, 2]})))
            .expect(1)
            .mount(&server)
            .await;

        let (ctx, _clock) = test_context();
        ctx.auth().store_tokens("stale", Some("refresh-1"), 3600).unwrap();

        let transport = Arc::new(ReqwestTransport::new(server.uri(), DEFAULT_TIMEOUT).unwrap());
        let client = ctx
            .client(transport.clone())
            .with_refresher(Arc::new(HttpTokenRefresher::new(transport)));

        let response = client
            .send(HttpRequest::get("/api/courses?page=1"))
            .await
            .unwrap();
        assert_eq!(response.body["items"], json!([1, 2]));
        assert_eq!(ctx.auth().access_token().as_deref(), Some("fresh"));
        assert_eq!(ctx.auth().refresh_token().as_deref(), Some("refresh-1"));
    }
}
