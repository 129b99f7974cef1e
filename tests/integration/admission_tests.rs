//! Admission control integration tests

#[cfg(test)]
mod tests {
    use crate::common::{started_context, test_context};
    use client_shield::core::rate_limiter::GLOBAL_BLOCK_KEY;
    use client_shield::{EndpointPolicy, ShieldConfig, ShieldError};

    const LOGIN: &str = "/api/traffic-auth/login";

    // ==================== Endpoint Windows ====================

    /// Five logins per minute, then a five minute block
    #[test]
    fn test_login_attempts_blocked_after_limit() {
        let (ctx, clock) = test_context();
        let limiter = ctx.rate_limiter();

        for _ in 0..5 {
            assert!(limiter.check_and_record(LOGIN).allowed);
            clock.advance_ms(1_000);
        }

        let decision = limiter.check_and_record(LOGIN);
        assert!(!decision.allowed);
        assert_eq!(decision.retry_after_ms, Some(300_000));
        assert!(decision.reason.unwrap().contains("5 requests per 60 seconds"));

        // Still blocked after the window has passed.
        clock.advance_ms(60_000);
        let err = limiter.check_and_record(LOGIN).into_result().unwrap_err();
        assert!(err.is_rate_limit_error());
        assert_eq!(err.retry_after_ms(), Some(240_000));

        clock.advance_ms(240_000);
        assert!(limiter.check_and_record(LOGIN).allowed);
    }

    /// Keys are independent; unknown keys fall back to the global policy
    #[test]
    fn test_unrelated_endpoints_unaffected_by_block() {
        let (ctx, clock) = test_context();
        let limiter = ctx.rate_limiter();

        for _ in 0..6 {
            limiter.check_and_record(LOGIN);
            clock.advance_ms(500);
        }
        assert!(limiter.is_blocked(LOGIN));
        assert!(!limiter.is_blocked("/api/courses"));
        assert!(limiter.check_and_record("/api/courses").allowed);

        let status = limiter.status("/api/courses");
        assert_eq!(status.max_requests, 60);
        assert_eq!(status.requests_in_window, 1);
        assert_eq!(status.remaining, 59);
        assert!(!status.is_blocked);
    }

    #[test]
    fn test_prefix_pattern_override() {
        let (ctx, clock) = test_context();
        let limiter = ctx.rate_limiter();
        limiter.set_endpoint_limit("/api/reports/*", EndpointPolicy::new(2, 10_000, 5_000));

        assert!(limiter.check_and_record("/api/reports/daily").allowed);
        clock.advance_ms(200);
        assert!(limiter.check_and_record("/api/reports/daily").allowed);
        clock.advance_ms(200);
        assert!(!limiter.check_and_record("/api/reports/daily").allowed);

        // The pattern applies per key, not to the prefix as a whole.
        assert!(limiter.check_and_record("/api/reports/weekly").allowed);
        assert_eq!(limiter.status("/api/reports/weekly").max_requests, 2);
    }

    // ==================== Global Ceiling ====================

    #[test]
    fn test_burst_triggers_global_block() {
        let (ctx, clock) = test_context();
        let limiter = ctx.rate_limiter();

        for i in 0..10 {
            assert!(limiter.check_and_record(&format!("/api/item/{}", i)).allowed);
        }
        let denied = limiter.check_and_record("/api/item/10");
        assert!(!denied.allowed);
        assert_eq!(denied.reason.as_deref(), Some("Too many requests per second"));

        // The global block now covers every key.
        clock.advance_ms(5_000);
        assert!(limiter.is_blocked("/api/anything"));
        assert_eq!(limiter.blocks().len(), 1);
        assert_eq!(limiter.blocks()[0].endpoint_key, GLOBAL_BLOCK_KEY);

        assert!(limiter.unblock(GLOBAL_BLOCK_KEY));
        assert!(limiter.check_and_record("/api/anything").allowed);
    }

    #[test]
    fn test_disabled_limiter_admits_everything() {
        let mut config = ShieldConfig::default();
        config.rate_limit.enabled = false;
        let (ctx, _clock) = crate::common::context_with(config);

        for _ in 0..100 {
            assert!(ctx.rate_limiter().check_and_record(LOGIN).allowed);
        }
        assert!(ctx.rate_limiter().blocks().is_empty());
    }

    // ==================== Sweeping ====================

    #[test]
    fn test_sweeper_drops_stale_state() {
        let (ctx, scheduler) = started_context(ShieldConfig::default());
        let limiter = ctx.rate_limiter();

        for _ in 0..6 {
            limiter.check_and_record(LOGIN);
            scheduler.advance_ms(500);
        }
        assert_eq!(limiter.blocks().len(), 1);

        scheduler.advance_ms(10 * 60_000);
        assert!(limiter.blocks().is_empty());
        assert_eq!(limiter.status(LOGIN).requests_in_window, 0);
        assert!(limiter.check_and_record(LOGIN).allowed);
    }

    #[test]
    fn test_denial_maps_to_rate_limit_error() {
        let (ctx, clock) = test_context();
        let limiter = ctx.rate_limiter();
        limiter.set_global_limit(EndpointPolicy::new(1, 60_000, 1_000));

        limiter.check_and_record("/api/a").into_result().unwrap();
        clock.advance_ms(100);
        match limiter.check_and_record("/api/a").into_result() {
            Err(ShieldError::RateLimit { retry_after_ms, .. }) => assert_eq!(retry_after_ms, 1_000),
            other => panic!("expected rate limit error, got {:?}", other),
        }
    }
}
