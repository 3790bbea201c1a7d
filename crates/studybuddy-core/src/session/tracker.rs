//! Session tracking glue.
//!
//! [`SessionTracker`] binds the state machine to a clock and a user, and
//! turns completions into ledger credits. The store arrives as a parameter
//! on [`SessionTracker::tick`] so callers keep ownership of it.

use std::sync::Arc;

use uuid::Uuid;

use crate::clock::Clock;
use crate::error::TimerError;
use crate::events::Event;
use crate::session::engine::{SessionStatus, SessionTimer};
use crate::session::lifecycle::AppLifecycle;
use crate::storage::StudyStore;

pub struct SessionTracker {
    timer: SessionTimer,
    clock: Arc<dyn Clock>,
    user_id: String,
    lifecycle: AppLifecycle,
}

impl SessionTracker {
    pub fn new(clock: Arc<dyn Clock>, user_id: impl Into<String>) -> Self {
        Self::from_parts(SessionTimer::new(), AppLifecycle::Active, clock, user_id)
    }

    /// Rebuild a tracker around previously persisted timer state.
    pub fn from_parts(
        timer: SessionTimer,
        lifecycle: AppLifecycle,
        clock: Arc<dyn Clock>,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            timer,
            clock,
            user_id: user_id.into(),
            lifecycle,
        }
    }

    pub fn timer(&self) -> &SessionTimer {
        &self.timer
    }

    pub fn lifecycle(&self) -> AppLifecycle {
        self.lifecycle
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn is_running(&self) -> bool {
        self.timer.is_running()
    }

    pub fn start(&mut self, target_secs: u64) -> Result<Event, TimerError> {
        self.timer.start(target_secs, self.clock.now_ms())
    }

    pub fn cancel(&mut self) -> Option<Event> {
        self.timer.cancel(self.clock.now_ms())
    }

    pub fn acknowledge(&mut self) -> Option<Event> {
        self.timer.acknowledge(self.clock.now_ms())
    }

    pub fn snapshot(&self) -> Event {
        self.timer.snapshot(self.clock.now_ms())
    }

    /// Advance the timer one tick. A completion is followed by exactly one
    /// ledger credit attempt; a failed credit leaves the session completed
    /// and is reported as [`Event::LedgerUpdateFailed`].
    pub fn tick(&mut self, store: &dyn StudyStore) -> Vec<Event> {
        let Some(completed) = self.timer.tick(self.clock.now_ms()) else {
            return Vec::new();
        };

        let credit = match &completed {
            Event::SessionCompleted {
                session_id,
                credited_min,
                ..
            } => Some(self.credit(store, *session_id, *credited_min)),
            _ => None,
        };
        std::iter::once(completed).chain(credit).collect()
    }

    /// Report a host lifecycle change, pairing it with the previously
    /// observed state. Repeats of the current state are ignored.
    pub fn apply_lifecycle(&mut self, to: AppLifecycle) -> Vec<Event> {
        let from = self.lifecycle;
        if from == to {
            return Vec::new();
        }
        self.lifecycle = to;
        self.timer
            .on_lifecycle(from, to, self.clock.now_ms())
            .into_iter()
            .collect()
    }

    fn credit(&self, store: &dyn StudyStore, session_id: Uuid, minutes: f64) -> Event {
        let at = self.clock.now();
        match store.increment_study_minutes(&self.user_id, session_id, minutes) {
            Ok(total_minutes) => Event::LedgerCredited {
                session_id,
                user_id: self.user_id.clone(),
                minutes,
                total_minutes,
                at,
            },
            Err(e) => {
                tracing::warn!(
                    %session_id,
                    user_id = %self.user_id,
                    error = %e,
                    "study ledger credit failed"
                );
                Event::LedgerUpdateFailed {
                    session_id,
                    user_id: self.user_id.clone(),
                    minutes,
                    message: e.to_string(),
                    at,
                }
            }
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.timer.status()
    }

    pub fn into_timer(self) -> SessionTimer {
        self.timer
    }
}
