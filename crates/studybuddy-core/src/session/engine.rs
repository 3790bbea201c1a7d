//! Study session state machine.
//!
//! ```text
//! Idle --start--> Running --tick * target reached--> Completed
//!                 Running --cancel--------------> Abandoned
//!                 Running --app backgrounded----> Abandoned
//!                 Completed | Abandoned --acknowledge--> Idle
//! ```
//!
//! The timer never sleeps and never reads the clock itself. Elapsed time is
//! the wall-clock delta between the start instant and the `now_ms` passed to
//! each call, so a process suspension shows up as one large delta on the
//! next tick rather than as drift. Callers drive `tick` on whatever cadence
//! suits them; one second is typical.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::clock::epoch_ms_to_utc;
use crate::error::TimerError;
use crate::events::Event;
use crate::session::lifecycle::AppLifecycle;

/// Where the session sits in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// No session underway, none awaiting acknowledgement.
    Idle,
    /// Counting toward the target duration.
    Running,
    /// Target reached; waiting to be acknowledged.
    Completed,
    /// Ended early; waiting to be acknowledged.
    Abandoned,
}

/// Why a session was abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AbandonReason {
    /// The user cancelled it.
    Cancelled,
    /// The app left the foreground while the session ran.
    Backgrounded,
}

/// The session timer state machine.
///
/// Plain data plus transition methods. Serializable so hosts can persist it
/// across process restarts; time always arrives as a `now_ms` argument.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionTimer {
    status: SessionStatus,
    session_id: Option<Uuid>,
    target_secs: u64,
    start_epoch_ms: u64,
    elapsed_secs: u64,
    #[serde(default)]
    abandon_reason: Option<AbandonReason>,
    /// An abandonment happened off-screen and has not been surfaced yet.
    #[serde(default)]
    notice_pending: bool,
    /// Wall-clock instant of the last Active -> Inactive transition.
    #[serde(default)]
    last_active_epoch_ms: Option<u64>,
}

impl SessionTimer {
    pub fn new() -> Self {
        Self {
            status: SessionStatus::Idle,
            session_id: None,
            target_secs: 0,
            start_epoch_ms: 0,
            elapsed_secs: 0,
            abandon_reason: None,
            notice_pending: false,
            last_active_epoch_ms: None,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin a session of `target_secs` at wall-clock `now_ms`.
    ///
    /// Rejected with [`TimerError::InvalidDuration`] for a zero target and
    /// with [`TimerError::ReentrantStart`] while a session is running; in
    /// both cases the timer is left untouched. Starting from `Completed` or
    /// `Abandoned` implicitly acknowledges the previous outcome.
    pub fn start(&mut self, target_secs: u64, now_ms: u64) -> Result<Event, TimerError> {
        if target_secs == 0 {
            return Err(TimerError::InvalidDuration { seconds: target_secs });
        }
        if self.status == SessionStatus::Running {
            return Err(TimerError::ReentrantStart);
        }

        let session_id = Uuid::new_v4();
        self.status = SessionStatus::Running;
        self.session_id = Some(session_id);
        self.target_secs = target_secs;
        self.start_epoch_ms = now_ms;
        self.elapsed_secs = 0;
        self.abandon_reason = None;
        self.notice_pending = false;

        Ok(Event::SessionStarted {
            session_id,
            target_secs,
            at: epoch_ms_to_utc(now_ms),
        })
    }

    /// Recompute elapsed time from the wall clock and complete the session
    /// if the target has been reached.
    ///
    /// No-op outside `Running`. Completion fires exactly once; later ticks
    /// return `None` until the outcome is acknowledged.
    pub fn tick(&mut self, now_ms: u64) -> Option<Event> {
        if self.status != SessionStatus::Running {
            return None;
        }
        let session_id = self.session_id?;

        self.refresh_elapsed(now_ms);
        if self.elapsed_secs < self.target_secs {
            return None;
        }

        self.status = SessionStatus::Completed;
        Some(Event::SessionCompleted {
            session_id,
            target_secs: self.target_secs,
            elapsed_secs: self.elapsed_secs,
            credited_min: self.target_secs as f64 / 60.0,
            at: epoch_ms_to_utc(now_ms),
        })
    }

    /// Abandon the running session at the user's request.
    ///
    /// No-op outside `Running`. Nothing is credited to the ledger.
    pub fn cancel(&mut self, now_ms: u64) -> Option<Event> {
        if self.status != SessionStatus::Running {
            return None;
        }
        let session_id = self.session_id?;

        self.refresh_elapsed(now_ms);
        self.status = SessionStatus::Abandoned;
        self.abandon_reason = Some(AbandonReason::Cancelled);

        Some(Event::SessionAbandoned {
            session_id,
            reason: AbandonReason::Cancelled,
            elapsed_secs: self.elapsed_secs,
            at: epoch_ms_to_utc(now_ms),
        })
    }

    /// Dismiss a terminal outcome, returning the timer to `Idle`.
    pub fn acknowledge(&mut self, now_ms: u64) -> Option<Event> {
        match self.status {
            SessionStatus::Completed | SessionStatus::Abandoned => {
                self.reset_to_idle();
                Some(Event::SessionAcknowledged {
                    at: epoch_ms_to_utc(now_ms),
                })
            }
            SessionStatus::Idle | SessionStatus::Running => None,
        }
    }

    /// React to a host lifecycle transition.
    ///
    /// Leaving the foreground while a session runs abandons it immediately;
    /// there is no pause or resume. An `Inactive` dip (screen lock, app
    /// switcher) keeps the session counting. Coming back out of
    /// `Background` surfaces the off-screen abandonment exactly once.
    pub fn on_lifecycle(
        &mut self,
        from: AppLifecycle,
        to: AppLifecycle,
        now_ms: u64,
    ) -> Option<Event> {
        use AppLifecycle::{Active, Background, Inactive};

        match (from, to) {
            (Active, Inactive) => {
                self.last_active_epoch_ms = Some(now_ms);
                None
            }
            (Active, Background) | (Inactive, Background) => self.abandon_backgrounded(now_ms),
            (Background, Active) | (Background, Inactive) => self.take_pending_notice(now_ms),
            _ => None,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// Point-in-time view of the timer without mutating it.
    ///
    /// While running, elapsed time is computed fresh from `now_ms`, so a
    /// snapshot taken between ticks is still current.
    pub fn snapshot(&self, now_ms: u64) -> Event {
        let elapsed_secs = match self.status {
            SessionStatus::Running => self.elapsed_at(now_ms),
            _ => self.elapsed_secs,
        };
        let progress = if self.target_secs == 0 {
            0.0
        } else {
            (elapsed_secs as f64 / self.target_secs as f64).min(1.0)
        };

        Event::StateSnapshot {
            status: self.status,
            session_id: self.session_id,
            target_secs: self.target_secs,
            elapsed_secs,
            remaining_secs: self.target_secs.saturating_sub(elapsed_secs),
            progress,
            at: epoch_ms_to_utc(now_ms),
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn session_id(&self) -> Option<Uuid> {
        self.session_id
    }

    pub fn target_secs(&self) -> u64 {
        self.target_secs
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed_secs
    }

    pub fn start_epoch_ms(&self) -> u64 {
        self.start_epoch_ms
    }

    pub fn abandon_reason(&self) -> Option<AbandonReason> {
        self.abandon_reason
    }

    pub fn last_active_epoch_ms(&self) -> Option<u64> {
        self.last_active_epoch_ms
    }

    pub fn is_running(&self) -> bool {
        self.status == SessionStatus::Running
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn abandon_backgrounded(&mut self, now_ms: u64) -> Option<Event> {
        if self.status != SessionStatus::Running {
            return None;
        }
        let session_id = self.session_id?;

        self.refresh_elapsed(now_ms);
        self.status = SessionStatus::Abandoned;
        self.abandon_reason = Some(AbandonReason::Backgrounded);
        self.notice_pending = true;

        Some(Event::SessionAbandoned {
            session_id,
            reason: AbandonReason::Backgrounded,
            elapsed_secs: self.elapsed_secs,
            at: epoch_ms_to_utc(now_ms),
        })
    }

    fn take_pending_notice(&mut self, now_ms: u64) -> Option<Event> {
        if !self.notice_pending {
            return None;
        }
        let session_id = self.session_id?;

        self.notice_pending = false;
        Some(Event::AbandonmentNotice {
            session_id,
            elapsed_secs: self.elapsed_secs,
            at: epoch_ms_to_utc(now_ms),
        })
    }

    // Floored whole seconds since start. The max keeps elapsed time from
    // walking backwards if the wall clock does.
    fn elapsed_at(&self, now_ms: u64) -> u64 {
        self.elapsed_secs
            .max(now_ms.saturating_sub(self.start_epoch_ms) / 1000)
    }

    fn refresh_elapsed(&mut self, now_ms: u64) {
        self.elapsed_secs = self.elapsed_at(now_ms);
    }

    fn reset_to_idle(&mut self) {
        self.status = SessionStatus::Idle;
        self.session_id = None;
        self.target_secs = 0;
        self.start_epoch_ms = 0;
        self.elapsed_secs = 0;
        self.abandon_reason = None;
        self.notice_pending = false;
    }
}

impl Default for SessionTimer {
    fn default() -> Self {
        Self::new()
    }
}
