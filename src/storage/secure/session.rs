//! Idle session tracking

use serde::{Deserialize, Serialize};

/// Idle-session state of a store.
///
/// `Expired` is left only by a new `set`. A fresh store starts `Expired`:
/// there is no session until something is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Active { last_activity_ms: u64 },
    Expired,
}

impl SessionState {
    pub fn is_active(&self) -> bool {
        matches!(self, SessionState::Active { .. })
    }

    /// Refresh the activity time of an active session
    pub(super) fn touch(&mut self, now_ms: u64) {
        if let SessionState::Active { last_activity_ms } = self {
            *last_activity_ms = now_ms;
        }
    }

    /// Start or refresh the session
    pub(super) fn arm(&mut self, now_ms: u64) {
        *self = SessionState::Active {
            last_activity_ms: now_ms,
        };
    }

    /// Idle time when an active session has reached `timeout_ms`
    pub(super) fn timed_out(&self, now_ms: u64, timeout_ms: u64) -> Option<u64> {
        match self {
            SessionState::Active { last_activity_ms } => {
                let idle = now_ms.saturating_sub(*last_activity_ms);
                (idle >= timeout_ms).then_some(idle)
            }
            SessionState::Expired => None,
        }
    }
}
