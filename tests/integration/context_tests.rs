//! Context lifecycle integration tests

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::common::{MockTransport, started_context};
    use client_shield::{HttpRequest, SetOptions, ShieldConfig, ShieldError};

    fn short_session() -> ShieldConfig {
        let mut config = ShieldConfig::default();
        config.storage.session_timeout_ms = 10_000;
        config.storage.check_interval_ms = 1_000;
        config
    }

    #[test]
    fn test_destroy_stops_all_tasks() {
        let (ctx, scheduler) = started_context(ShieldConfig::default());
        assert_eq!(scheduler.active_tasks(), 3);

        ctx.destroy();
        assert_eq!(scheduler.active_tasks(), 0);
        ctx.destroy();
    }

    #[test]
    fn test_drop_cancels_tasks() {
        let (ctx, scheduler) = started_context(ShieldConfig::default());
        drop(ctx);
        assert_eq!(scheduler.active_tasks(), 0);
    }

    #[tokio::test]
    async fn test_idle_session_logs_out_client() {
        let (ctx, scheduler) = started_context(short_session());
        let expired = Arc::new(AtomicUsize::new(0));
        let counter = expired.clone();
        ctx.store().on_session_expired(move |err| {
            assert!(matches!(err, ShieldError::SessionExpired { .. }));
            counter.fetch_add(1, Ordering::SeqCst);
        });

        ctx.auth().store_tokens("access", Some("refresh"), 3600).unwrap();
        ctx.store()
            .set("prefs", &serde_json::json!({"theme": "dark"}), SetOptions::default())
            .unwrap();

        let transport = Arc::new(MockTransport::new());
        let client = ctx.client(transport.clone());

        scheduler.advance_ms(9_000);
        ctx.store().touch();
        client.send(HttpRequest::get("/api/courses")).await.unwrap();

        scheduler.advance_ms(10_000);
        assert_eq!(expired.load(Ordering::SeqCst), 1);
        assert!(ctx.store().is_empty());

        client.send(HttpRequest::get("/api/courses")).await.unwrap();
        let sent = transport.requests();
        assert!(sent[0].headers.contains_key("Authorization"));
        assert!(!sent[1].headers.contains_key("Authorization"));
    }
}
