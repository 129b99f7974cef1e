//! Health monitor implementation

use super::probe::MemoryProbe;
use super::types::{ErrorSample, LatencySample};
use crate::config::models::monitoring::HealthConfig;
use crate::core::clock::Clock;
use crate::core::scheduler::{Scheduler, TaskHandle};
use crate::monitoring::types::{Alert, AlertKind, AlertSeverity, HealthMetrics, HealthStatus};
use crate::utils::error::Result;
use crate::utils::format_uptime;
use parking_lot::{Mutex, RwLock};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Trailing window used for derived metrics
const METRICS_WINDOW_MS: u64 = 60_000;
/// An unresolved alert of the same kind younger than this suppresses a new one
const ALERT_DEDUP_WINDOW_MS: u64 = 5 * 60_000;
/// Alerts kept, most recent last
const MAX_ALERTS: usize = 100;
/// Memory usage above this is always critical
const CRITICAL_MEMORY_PERCENT: f64 = 90.0;

/// Invoked for every alert that is raised (not for suppressed duplicates)
pub type AlertCallback = Arc<dyn Fn(&Alert) + Send + Sync>;

/// Aggregates request outcomes into metrics, alerts and a status
pub struct HealthMonitor {
    clock: Arc<dyn Clock>,
    memory_probe: Option<Arc<dyn MemoryProbe>>,
    pub(super) state: Mutex<MonitorState>,
    callbacks: RwLock<Vec<AlertCallback>>,
    task: Mutex<Option<TaskHandle>>,
}

pub(super) struct MonitorState {
    pub(super) config: HealthConfig,
    pub(super) started_at_ms: u64,
    pub(super) errors: VecDeque<ErrorSample>,
    pub(super) latencies: VecDeque<LatencySample>,
    pub(super) successful_requests: u64,
    pub(super) alerts: VecDeque<Alert>,
}

impl std::fmt::Debug for HealthMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("HealthMonitor")
            .field("enabled", &state.config.enabled)
            .field("errors", &state.errors.len())
            .field("latencies", &state.latencies.len())
            .field("alerts", &state.alerts.len())
            .field("memory_probe", &self.memory_probe)
            .finish()
    }
}

impl HealthMonitor {
    /// Create a new health monitor without a memory probe
    pub fn new(config: HealthConfig, clock: Arc<dyn Clock>) -> Self {
        let started_at_ms = clock.now_ms();
        Self {
            clock,
            memory_probe: None,
            state: Mutex::new(MonitorState {
                config,
                started_at_ms,
                errors: VecDeque::new(),
                latencies: VecDeque::new(),
                successful_requests: 0,
                alerts: VecDeque::new(),
            }),
            callbacks: RwLock::new(Vec::new()),
            task: Mutex::new(None),
        }
    }

    /// Attach a memory probe
    pub fn with_memory_probe(mut self, probe: Arc<dyn MemoryProbe>) -> Self {
        self.memory_probe = Some(probe);
        self
    }

    pub fn record_error(&self, message: &str, endpoint: Option<&str>, status_code: Option<u16>) {
        let now = self.clock.now_ms();
        let mut state = self.state.lock();
        if !state.config.enabled {
            return;
        }
        state.errors.push_back(ErrorSample {
            timestamp_ms: now,
            message: message.to_string(),
            endpoint: endpoint.map(str::to_string),
            status_code,
        });
    }

    pub fn record_success(&self) {
        let mut state = self.state.lock();
        if state.config.enabled {
            state.successful_requests += 1;
        }
    }

    /// Record a response time, warning immediately when it is above threshold
    pub fn record_response_time(&self, endpoint: &str, duration_ms: f64) {
        let now = self.clock.now_ms();
        let mut state = self.state.lock();
        if !state.config.enabled {
            return;
        }
        state.latencies.push_back(LatencySample {
            timestamp_ms: now,
            endpoint: endpoint.to_string(),
            duration_ms,
        });

        let threshold = state.config.response_time_threshold_ms;
        if duration_ms > threshold {
            warn!(
                endpoint = endpoint,
                duration_ms = duration_ms,
                threshold_ms = threshold,
                "Slow API response"
            );
        }
    }

    /// Metrics over the trailing minute
    pub fn metrics(&self) -> HealthMetrics {
        let now = self.clock.now_ms();
        let window_start = now.saturating_sub(METRICS_WINDOW_MS);

        let mut metrics = {
            let state = self.state.lock();
            let recent_errors: Vec<&ErrorSample> = state
                .errors
                .iter()
                .filter(|e| e.timestamp_ms > window_start)
                .collect();
            let (latency_sum, latency_count) = state
                .latencies
                .iter()
                .filter(|l| l.timestamp_ms > window_start)
                .fold((0.0, 0usize), |(sum, count), l| (sum + l.duration_ms, count + 1));

            HealthMetrics {
                error_rate: recent_errors.len() as f64,
                avg_response_time_ms: if latency_count > 0 {
                    latency_sum / latency_count as f64
                } else {
                    0.0
                },
                memory_usage_percent: 0.0,
                failed_requests: recent_errors
                    .iter()
                    .filter(|e| e.is_failed_request())
                    .count() as u64,
                successful_requests: state.successful_requests,
                uptime_ms: now.saturating_sub(state.started_at_ms),
            }
        };

        metrics.memory_usage_percent = self
            .memory_probe
            .as_ref()
            .and_then(|probe| probe.usage_percent())
            .unwrap_or(0.0);
        metrics
    }

    /// Compare current metrics against thresholds and raise alerts
    pub fn run_health_check(&self) {
        let metrics = self.metrics();
        let config = self.state.lock().config.clone();

        if metrics.error_rate > config.error_rate_threshold {
            self.raise(
                AlertKind::ErrorRate,
                format!(
                    "High error rate: {:.1} errors/min (threshold: {})",
                    metrics.error_rate, config.error_rate_threshold
                ),
                severity_for(metrics.error_rate, config.error_rate_threshold * 2.0),
            );
        }

        if metrics.avg_response_time_ms > config.response_time_threshold_ms {
            self.raise(
                AlertKind::ResponseTime,
                format!(
                    "Slow response time: {:.0}ms (threshold: {}ms)",
                    metrics.avg_response_time_ms, config.response_time_threshold_ms
                ),
                severity_for(
                    metrics.avg_response_time_ms,
                    config.response_time_threshold_ms * 2.0,
                ),
            );
        }

        if metrics.memory_usage_percent > config.memory_threshold_percent {
            self.raise(
                AlertKind::Memory,
                format!(
                    "High memory usage: {:.1}% (threshold: {}%)",
                    metrics.memory_usage_percent, config.memory_threshold_percent
                ),
                severity_for(metrics.memory_usage_percent, CRITICAL_MEMORY_PERCENT),
            );
        }

        if metrics.failed_requests > config.failed_request_threshold {
            self.raise(
                AlertKind::Failures,
                format!(
                    "High failure rate: {} failed requests in last minute",
                    metrics.failed_requests
                ),
                AlertSeverity::Warning,
            );
        }

        debug!(
            error_rate = metrics.error_rate,
            avg_response_time_ms = metrics.avg_response_time_ms,
            failed_requests = metrics.failed_requests,
            successful_requests = metrics.successful_requests,
            uptime = %format_uptime(metrics.uptime_ms),
            "Health check"
        );
    }

    /// Derive the overall status from unresolved alerts and current metrics
    pub fn status(&self) -> HealthStatus {
        let metrics = self.metrics();
        let state = self.state.lock();
        let config = &state.config;

        let unresolved = |severity| {
            state
                .alerts
                .iter()
                .any(|a| !a.resolved && a.severity == severity)
        };

        if unresolved(AlertSeverity::Critical)
            || metrics.error_rate > config.error_rate_threshold * 2.0
        {
            HealthStatus::Unhealthy
        } else if unresolved(AlertSeverity::Warning)
            || metrics.error_rate > config.error_rate_threshold / 2.0
            || metrics.avg_response_time_ms > config.response_time_threshold_ms / 2.0
        {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        }
    }

    /// Periodic work: health check followed by pruning
    pub fn tick(&self) {
        if !self.state.lock().config.enabled {
            return;
        }
        self.run_health_check();
        self.prune();
    }

    /// Drop samples older than the retention window and cap alerts
    pub fn prune(&self) {
        let now = self.clock.now_ms();
        let mut state = self.state.lock();
        let cutoff = now.saturating_sub(state.config.retention_ms());

        state.errors.retain(|e| e.timestamp_ms > cutoff);
        state.latencies.retain(|l| l.timestamp_ms > cutoff);
        while state.alerts.len() > MAX_ALERTS {
            state.alerts.pop_front();
        }
    }

    /// Raise a custom alert
    pub fn alert(&self, message: &str, severity: AlertSeverity) -> Option<Alert> {
        self.raise(AlertKind::Custom, message.to_string(), severity)
    }

    /// Alerts, oldest first
    pub fn alerts(&self, include_resolved: bool) -> Vec<Alert> {
        self.state
            .lock()
            .alerts
            .iter()
            .filter(|a| include_resolved || !a.resolved)
            .cloned()
            .collect()
    }

    /// Mark an alert resolved, returns false for unknown ids
    pub fn resolve_alert(&self, id: &str) -> bool {
        let mut state = self.state.lock();
        match state.alerts.iter_mut().find(|a| a.id == id) {
            Some(alert) => {
                alert.resolved = true;
                info!("Alert resolved: {}", id);
                true
            }
            None => false,
        }
    }

    /// Register a callback invoked for every raised alert
    pub fn on_alert<F>(&self, callback: F)
    where
        F: Fn(&Alert) + Send + Sync + 'static,
    {
        self.callbacks.write().push(Arc::new(callback));
    }

    /// Replace the thresholds. A running tick keeps its interval until restarted.
    pub fn configure(&self, config: HealthConfig) {
        self.state.lock().config = config;
    }

    pub fn config(&self) -> HealthConfig {
        self.state.lock().config.clone()
    }

    /// Uptime formatted as `1d 2h`, `3h 4m`, `5m 6s` or `7s`
    pub fn uptime(&self) -> String {
        let now = self.clock.now_ms();
        format_uptime(now.saturating_sub(self.state.lock().started_at_ms))
    }

    /// Clear samples, counters and alerts and restart the uptime clock
    pub fn reset(&self) {
        let now = self.clock.now_ms();
        let mut state = self.state.lock();
        state.errors.clear();
        state.latencies.clear();
        state.alerts.clear();
        state.successful_requests = 0;
        state.started_at_ms = now;
    }

    /// Register the periodic tick. Does nothing when monitoring is disabled.
    pub fn start(self: &Arc<Self>, scheduler: &dyn Scheduler) -> Result<()> {
        let config = self.config();
        if !config.enabled {
            debug!("Health monitoring disabled, not scheduling checks");
            return Ok(());
        }

        let monitor = Arc::downgrade(self);
        let handle = scheduler.register_periodic_task(
            "health-check",
            Duration::from_millis(config.check_interval_ms),
            Arc::new(move || {
                if let Some(monitor) = monitor.upgrade() {
                    monitor.tick();
                }
            }),
        )?;

        if let Some(previous) = self.task.lock().replace(handle) {
            previous.cancel();
        }
        info!(
            "Health monitoring started, checking every {}ms",
            config.check_interval_ms
        );
        Ok(())
    }

    /// Stop the periodic tick. Safe to call repeatedly.
    pub fn destroy(&self) {
        if let Some(handle) = self.task.lock().take() {
            handle.cancel();
        }
    }

    /// Store an alert unless an unresolved one of the same kind is recent
    fn raise(&self, kind: AlertKind, message: String, severity: AlertSeverity) -> Option<Alert> {
        let now = self.clock.now_ms();
        let alert = {
            let mut state = self.state.lock();
            let duplicate = state.alerts.iter().any(|a| {
                a.kind == kind
                    && !a.resolved
                    && now.saturating_sub(a.created_at_ms) < ALERT_DEDUP_WINDOW_MS
            });
            if duplicate {
                debug!("Suppressing duplicate {} alert", kind);
                return None;
            }

            let alert = Alert {
                id: uuid::Uuid::new_v4().to_string(),
                kind,
                message,
                severity,
                created_at_ms: now,
                resolved: false,
            };
            state.alerts.push_back(alert.clone());
            if state.alerts.len() > MAX_ALERTS {
                state.alerts.pop_front();
            }
            alert
        };

        match severity {
            AlertSeverity::Critical => error!(kind = %kind, "Health alert: {}", alert.message),
            AlertSeverity::Warning => warn!(kind = %kind, "Health alert: {}", alert.message),
        }

        let callbacks = self.callbacks.read().clone();
        for callback in callbacks {
            callback(&alert);
        }
        Some(alert)
    }
}

fn severity_for(value: f64, critical_above: f64) -> AlertSeverity {
    if value > critical_above {
        AlertSeverity::Critical
    } else {
        AlertSeverity::Warning
    }
}
