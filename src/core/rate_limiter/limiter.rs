//! Core rate limiter implementation

use super::types::{
    AdmissionDecision, BlockEntry, GLOBAL_BLOCK_KEY, RateLimitStatus, SecondBucket,
};
use crate::config::models::rate_limit::{EndpointPolicy, EndpointRule, RateLimitConfig};
use crate::core::clock::Clock;
use crate::core::scheduler::{Scheduler, TaskHandle};
use crate::utils::error::Result;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

const SECOND_MS: u64 = 1000;

/// Client-side admission controller.
///
/// Every decision runs inside one synchronous critical section, so a
/// check followed by a record can never interleave with another caller.
pub struct RateLimiter {
    clock: Arc<dyn Clock>,
    pub(super) state: Mutex<LimiterState>,
    sweeper: Mutex<Option<TaskHandle>>,
}

pub(super) struct LimiterState {
    pub(super) config: RateLimitConfig,
    /// Admitted request timestamps per endpoint key, oldest first
    pub(super) records: HashMap<String, VecDeque<u64>>,
    pub(super) blocks: HashMap<String, BlockEntry>,
    pub(super) second: SecondBucket,
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("RateLimiter")
            .field("enabled", &state.config.enabled)
            .field("tracked_keys", &state.records.len())
            .field("blocks", &state.blocks.len())
            .finish()
    }
}

impl RateLimiter {
    /// Create a new rate limiter
    pub fn new(config: RateLimitConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            state: Mutex::new(LimiterState {
                config,
                records: HashMap::new(),
                blocks: HashMap::new(),
                second: SecondBucket::default(),
            }),
            sweeper: Mutex::new(None),
        }
    }

    /// Decide whether a request to `key` may proceed and record it if so
    pub fn check_and_record(&self, key: &str) -> AdmissionDecision {
        let now = self.clock.now_ms();
        let mut state = self.state.lock();

        if !state.config.enabled {
            return AdmissionDecision::allow();
        }

        state.drop_expired_blocks(key, now);
        if let Some(remaining) = state.live_block_remaining(key, now) {
            debug!("Request to {} rejected, blocked for {}ms", key, remaining);
            return AdmissionDecision::deny(
                "Endpoint temporarily blocked due to rate limiting",
                remaining,
            );
        }

        if now.saturating_sub(state.second.start_ms) < SECOND_MS {
            state.second.count += 1;
        } else {
            state.second = SecondBucket {
                start_ms: now,
                count: 1,
            };
        }

        if state.second.count > state.config.global_per_second_limit {
            let duration = state.config.global.block_duration_ms;
            state.block(
                GLOBAL_BLOCK_KEY,
                now,
                duration,
                "Too many requests per second (possible DDoS)",
            );
            return AdmissionDecision::deny("Too many requests per second", duration);
        }

        let policy = state.resolve_policy(key);
        let window_start = now.saturating_sub(policy.window_ms);
        let in_window = state
            .records
            .get(key)
            .map_or(0, |records| count_since(records, window_start));

        if in_window >= policy.max_requests as usize {
            let reason = format!(
                "Rate limit exceeded: {} requests per {} seconds",
                policy.max_requests,
                policy.window_ms / SECOND_MS
            );
            state.block(key, now, policy.block_duration_ms, &reason);
            return AdmissionDecision::deny(reason, policy.block_duration_ms);
        }

        state
            .records
            .entry(key.to_string())
            .or_default()
            .push_back(now);

        AdmissionDecision::allow()
    }

    /// Whether a live block applies to `key` (including a global block)
    pub fn is_blocked(&self, key: &str) -> bool {
        let now = self.clock.now_ms();
        self.state.lock().live_block_remaining(key, now).is_some()
    }

    /// Remaining block time for `key`, 0 when not blocked
    pub fn blocked_remaining_ms(&self, key: &str) -> u64 {
        let now = self.clock.now_ms();
        self.state.lock().live_block_remaining(key, now).unwrap_or(0)
    }

    /// Current usage of `key` under its resolved policy
    pub fn status(&self, key: &str) -> RateLimitStatus {
        let now = self.clock.now_ms();
        let state = self.state.lock();
        let policy = state.resolve_policy(key);
        let window_start = now.saturating_sub(policy.window_ms);
        let requests_in_window = state
            .records
            .get(key)
            .map_or(0, |records| count_since(records, window_start))
            as u32;

        let block = [key, GLOBAL_BLOCK_KEY]
            .iter()
            .filter_map(|k| state.blocks.get(*k))
            .find(|b| b.is_live(now));

        RateLimitStatus {
            requests_in_window,
            max_requests: policy.max_requests,
            window_ms: policy.window_ms,
            remaining: policy.max_requests.saturating_sub(requests_in_window),
            is_blocked: block.is_some(),
            blocked_reason: block.map(|b| b.reason.clone()),
        }
    }

    /// Manually lift the block on `key`
    pub fn unblock(&self, key: &str) -> bool {
        let removed = self.state.lock().blocks.remove(key).is_some();
        if removed {
            info!("Endpoint unblocked: {}", key);
        }
        removed
    }

    /// Add or replace the policy for an exact key or prefix pattern
    pub fn set_endpoint_limit(&self, pattern: &str, policy: EndpointPolicy) {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        match state
            .config
            .endpoints
            .iter_mut()
            .find(|rule| rule.pattern == pattern)
        {
            Some(rule) => rule.policy = policy,
            None => state.config.endpoints.push(EndpointRule::new(pattern, policy)),
        }
    }

    /// Replace the fallback policy
    pub fn set_global_limit(&self, policy: EndpointPolicy) {
        self.state.lock().config.global = policy;
    }

    /// Live block entries
    pub fn blocks(&self) -> Vec<BlockEntry> {
        let now = self.clock.now_ms();
        let state = self.state.lock();
        let mut blocks: Vec<BlockEntry> = state
            .blocks
            .values()
            .filter(|b| b.is_live(now))
            .cloned()
            .collect();
        blocks.sort_by(|a, b| a.endpoint_key.cmp(&b.endpoint_key));
        blocks
    }

    /// Forget every record, block and the per-second bucket
    pub fn reset(&self) {
        let mut state = self.state.lock();
        state.records.clear();
        state.blocks.clear();
        state.second = SecondBucket::default();
    }

    pub fn is_enabled(&self) -> bool {
        self.state.lock().config.enabled
    }

    /// Prune records past retention and expired blocks
    pub fn sweep(&self) {
        let now = self.clock.now_ms();
        let mut state = self.state.lock();
        let cutoff = now.saturating_sub(state.config.retention_ms);

        state.records.retain(|_, records| {
            records.retain(|&ts| ts >= cutoff);
            !records.is_empty()
        });
        state.blocks.retain(|_, block| block.is_live(now));

        debug!(
            "Rate limiter sweep: {} keys tracked, {} blocks live",
            state.records.len(),
            state.blocks.len()
        );
    }

    /// Register the periodic sweep with `scheduler`
    pub fn start_sweeper(self: &Arc<Self>, scheduler: &dyn Scheduler) -> Result<()> {
        let interval = Duration::from_millis(self.state.lock().config.sweep_interval_ms);
        let limiter = Arc::downgrade(self);
        let handle = scheduler.register_periodic_task(
            "rate-limiter-sweep",
            interval,
            Arc::new(move || {
                if let Some(limiter) = limiter.upgrade() {
                    limiter.sweep();
                }
            }),
        )?;

        if let Some(previous) = self.sweeper.lock().replace(handle) {
            previous.cancel();
        }
        Ok(())
    }

    /// Stop the periodic sweep. Safe to call repeatedly.
    pub fn destroy(&self) {
        if let Some(handle) = self.sweeper.lock().take() {
            handle.cancel();
        }
    }
}

impl LimiterState {
    /// Largest remaining time among the live key block and global block
    /// Delete lapsed blocks on `key` and the global key
    fn drop_expired_blocks(&mut self, key: &str, now: u64) {
        for k in [key, GLOBAL_BLOCK_KEY] {
            if self.blocks.get(k).is_some_and(|b| !b.is_live(now)) {
                self.blocks.remove(k);
                debug!("Block on {} lapsed", k);
            }
        }
    }

    fn live_block_remaining(&self, key: &str, now: u64) -> Option<u64> {
        [key, GLOBAL_BLOCK_KEY]
            .iter()
            .filter_map(|k| self.blocks.get(*k))
            .filter(|b| b.is_live(now))
            .map(|b| b.remaining_ms(now))
            .max()
    }

    /// Exact key, then first matching prefix pattern, then the global policy
    pub(super) fn resolve_policy(&self, key: &str) -> EndpointPolicy {
        let rules = &self.config.endpoints;
        rules
            .iter()
            .find(|rule| rule.pattern == key)
            .or_else(|| {
                rules
                    .iter()
                    .find(|rule| key.starts_with(rule.pattern.trim_end_matches('*')))
            })
            .map_or(self.config.global, |rule| rule.policy)
    }

    fn block(&mut self, key: &str, now: u64, duration_ms: u64, reason: &str) {
        warn!("Endpoint blocked: {} - {}", key, reason);
        self.blocks.insert(
            key.to_string(),
            BlockEntry {
                endpoint_key: key.to_string(),
                blocked_until_ms: now.saturating_add(duration_ms),
                reason: reason.to_string(),
            },
        );
    }
}

/// The wall clock may step backwards, so every record is inspected
fn count_since(records: &VecDeque<u64>, window_start: u64) -> usize {
    records.iter().filter(|&&ts| ts >= window_start).count()
}
