//! Periodic task scheduling
//!
//! Sweeps and health checks are registered through [`Scheduler`] rather than
//! spawning timers directly, so tests can drive them with a virtual clock.

use crate::core::clock::{Clock, MockClock};
use crate::utils::error::{Result, ShieldError};
use parking_lot::Mutex;
use std::fmt::Debug;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

/// Work executed on every tick
pub type PeriodicTask = Arc<dyn Fn() + Send + Sync>;

/// Port for registering periodic work
pub trait Scheduler: Send + Sync + Debug {
    /// Run `task` every `interval` until the returned handle is cancelled.
    /// The first run happens one full interval after registration.
    fn register_periodic_task(
        &self,
        name: &str,
        interval: Duration,
        task: PeriodicTask,
    ) -> Result<TaskHandle>;
}

/// Handle to a registered periodic task
///
/// Dropping the handle leaves the task running; call [`TaskHandle::cancel`].
#[derive(Debug)]
pub struct TaskHandle {
    name: String,
    cancelled: Arc<AtomicBool>,
    join: Option<JoinHandle<()>>,
}

impl TaskHandle {
    fn new(name: &str, cancelled: Arc<AtomicBool>, join: Option<JoinHandle<()>>) -> Self {
        Self {
            name: name.to_string(),
            cancelled,
            join,
        }
    }

    /// Stop the task. Safe to call any number of times.
    pub fn cancel(&self) {
        if self.cancelled.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Some(join) = &self.join {
            join.abort();
        }
        debug!("Cancelled periodic task '{}'", self.name);
    }

    /// Whether [`TaskHandle::cancel`] has been called
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Task name given at registration
    pub fn name(&self) -> &str {
        &self.name
    }
}

fn validate_interval(name: &str, interval: Duration) -> Result<()> {
    if interval.is_zero() {
        return Err(ShieldError::Scheduler(format!(
            "Periodic task '{}' needs a non-zero interval",
            name
        )));
    }
    Ok(())
}

/// Scheduler backed by tokio interval loops
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioScheduler;

impl TokioScheduler {
    /// Create a new tokio scheduler
    pub fn new() -> Self {
        Self
    }
}

impl Scheduler for TokioScheduler {
    fn register_periodic_task(
        &self,
        name: &str,
        interval: Duration,
        task: PeriodicTask,
    ) -> Result<TaskHandle> {
        validate_interval(name, interval)?;
        let runtime = tokio::runtime::Handle::try_current().map_err(|e| {
            ShieldError::Scheduler(format!("No tokio runtime for task '{}': {}", name, e))
        })?;

        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = cancelled.clone();
        let task_name = name.to_string();

        let join = runtime.spawn(async move {
            let start = tokio::time::Instant::now() + interval;
            let mut ticker = tokio::time::interval_at(start, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if flag.load(Ordering::Acquire) {
                    break;
                }
                task();
            }
            debug!("Periodic task '{}' stopped", task_name);
        });

        debug!("Registered periodic task '{}' every {:?}", name, interval);
        Ok(TaskHandle::new(name, cancelled, Some(join)))
    }
}

struct ManualTask {
    name: String,
    interval_ms: u64,
    next_due_ms: u64,
    task: PeriodicTask,
    cancelled: Arc<AtomicBool>,
}

/// Deterministic scheduler driven by a [`MockClock`]
///
/// [`ManualScheduler::advance`] moves the clock forward and runs every task
/// that falls due on the way, in due-time order, with the clock set to each
/// task's due time while it runs.
#[derive(Clone)]
pub struct ManualScheduler {
    clock: MockClock,
    tasks: Arc<Mutex<Vec<ManualTask>>>,
}

impl Debug for ManualScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManualScheduler")
            .field("now_ms", &self.clock.now_ms())
            .field("tasks", &self.active_tasks())
            .finish()
    }
}

impl ManualScheduler {
    /// Create a scheduler that advances `clock`
    pub fn new(clock: MockClock) -> Self {
        Self {
            clock,
            tasks: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// The clock this scheduler drives
    pub fn clock(&self) -> &MockClock {
        &self.clock
    }

    /// Number of registered tasks that have not been cancelled
    pub fn active_tasks(&self) -> usize {
        self.tasks
            .lock()
            .iter()
            .filter(|t| !t.cancelled.load(Ordering::Acquire))
            .count()
    }

    /// Advance virtual time, running due tasks along the way
    pub fn advance(&self, duration: Duration) {
        let target = self.clock.now_ms() + duration.as_millis() as u64;

        while let Some((due, task)) = self.next_due(target) {
            if due > self.clock.now_ms() {
                self.clock.set_ms(due);
            }
            // Run outside the lock: tasks may register or cancel other tasks.
            task();
        }

        if target > self.clock.now_ms() {
            self.clock.set_ms(target);
        }
    }

    /// Advance virtual time by a number of milliseconds
    pub fn advance_ms(&self, ms: u64) {
        self.advance(Duration::from_millis(ms));
    }

    fn next_due(&self, target: u64) -> Option<(u64, PeriodicTask)> {
        let mut tasks = self.tasks.lock();
        tasks.retain(|t| !t.cancelled.load(Ordering::Acquire));

        let next = tasks
            .iter_mut()
            .filter(|t| t.next_due_ms <= target)
            .min_by_key(|t| t.next_due_ms)?;

        let due = next.next_due_ms;
        next.next_due_ms += next.interval_ms;
        Some((due, next.task.clone()))
    }
}

impl Scheduler for ManualScheduler {
    fn register_periodic_task(
        &self,
        name: &str,
        interval: Duration,
        task: PeriodicTask,
    ) -> Result<TaskHandle> {
        validate_interval(name, interval)?;
        let interval_ms = (interval.as_millis() as u64).max(1);
        let cancelled = Arc::new(AtomicBool::new(false));

        let mut tasks = self.tasks.lock();
        if tasks.iter().any(|t| t.name == name && !t.cancelled.load(Ordering::Acquire)) {
            warn!("Periodic task '{}' registered more than once", name);
        }
        tasks.push(ManualTask {
            name: name.to_string(),
            interval_ms,
            next_due_ms: self.clock.now_ms() + interval_ms,
            task,
            cancelled: cancelled.clone(),
        });

        Ok(TaskHandle::new(name, cancelled, None))
    }
}
