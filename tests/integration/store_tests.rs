//! Protected store integration tests

#[cfg(test)]
mod tests {
    use crate::common::{context_with, started_context, test_context};
    use client_shield::storage::secure::REFRESH_TOKEN_TTL_MS;
    use client_shield::{SessionState, SetOptions, ShieldConfig};
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct User {
        id: u64,
        name: String,
    }

    fn keyed(key: &str) -> ShieldConfig {
        let mut config = ShieldConfig::default();
        config.storage.encryption_key = Some(key.to_string());
        config
    }

    #[test]
    fn test_login_session_round_trip() {
        let (ctx, _clock) = test_context();
        let auth = ctx.auth();
        assert!(!auth.is_authenticated());
        assert_eq!(ctx.store().session_state(), SessionState::Expired);

        auth.store_tokens("access", Some("refresh"), 900).unwrap();
        auth.set_user(&User {
            id: 42,
            name: "Ada".to_string(),
        })
        .unwrap();

        assert!(auth.is_authenticated());
        assert!(ctx.store().session_state().is_active());
        assert_eq!(auth.user::<User>().unwrap().name, "Ada");
    }

    #[test]
    fn test_access_token_expires_before_refresh_token() {
        let mut config = keyed("store-key");
        config.storage.session_timeout_ms = 30 * 24 * 60 * 60 * 1000;
        let (ctx, clock) = context_with(config);
        let auth = ctx.auth();

        auth.store_tokens("access", Some("refresh"), 900).unwrap();
        clock.advance_ms(900_000);
        assert_eq!(auth.access_token(), None);
        assert_eq!(auth.refresh_token().as_deref(), Some("refresh"));

        clock.advance_ms(REFRESH_TOKEN_TTL_MS - 900_000);
        assert_eq!(auth.refresh_token(), None);
    }

    #[test]
    fn test_ttl_items_purged_by_tick() {
        let (ctx, scheduler) = started_context(ShieldConfig::default());
        let store = ctx.store();

        store
            .set_str("otp", "123456", SetOptions::encrypted().with_ttl(30_000))
            .unwrap();
        store.set_str("theme", "dark", SetOptions::default()).unwrap();
        assert_eq!(store.len(), 2);

        // The first tick runs one check interval after start.
        scheduler.advance_ms(60_000);
        assert_eq!(store.len(), 1);
        assert_eq!(store.get_string("theme").unwrap().as_deref(), Some("dark"));
    }

    #[test]
    fn test_idle_timeout_clears_everything() {
        let mut config = ShieldConfig::default();
        config.storage.session_timeout_ms = 120_000;
        let (ctx, scheduler) = started_context(config);

        ctx.auth().store_tokens("access", Some("refresh"), 0).unwrap();
        ctx.store().set_str("draft", "hello", SetOptions::default()).unwrap();

        scheduler.advance_ms(60_000);
        assert!(!ctx.store().is_empty());

        scheduler.advance_ms(60_000);
        assert!(ctx.store().is_empty());
        assert!(ctx.auth().access_token().is_none());
        assert_eq!(ctx.store().session_state(), SessionState::Expired);
    }

    #[test]
    fn test_configured_key_is_stable_across_contexts() {
        let (first, _) = context_with(keyed("shared-key"));
        let (second, _) = context_with(keyed("shared-key"));

        let token = first.csrf().generate().unwrap();
        assert!(second.csrf().verify(&token, 60_000));

        let (other, _) = context_with(keyed("different-key"));
        assert!(!other.csrf().verify(&token, 60_000));
    }
}
