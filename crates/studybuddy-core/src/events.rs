//! Event definitions for the session core.
//!
//! Every observable state change produces an [`Event`]. The hosting UI
//! consumes them as notifications and the CLI prints them as JSON, so the
//! serialized form is part of the public surface.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::session::{AbandonReason, SessionStatus};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    /// A study session began counting.
    SessionStarted {
        session_id: Uuid,
        target_secs: u64,
        at: DateTime<Utc>,
    },
    /// The target duration was reached.
    SessionCompleted {
        session_id: Uuid,
        target_secs: u64,
        elapsed_secs: u64,
        /// Minutes owed to the study ledger. Fractional values are kept.
        credited_min: f64,
        at: DateTime<Utc>,
    },
    /// The session ended before reaching its target.
    SessionAbandoned {
        session_id: Uuid,
        reason: AbandonReason,
        elapsed_secs: u64,
        at: DateTime<Utc>,
    },
    /// Surfaced once on return to the foreground when the session was
    /// abandoned while the app sat in the background.
    AbandonmentNotice {
        session_id: Uuid,
        elapsed_secs: u64,
        at: DateTime<Utc>,
    },
    /// A terminal session outcome was dismissed; the timer is idle again.
    SessionAcknowledged { at: DateTime<Utc> },
    /// The study ledger accepted a completed session's minutes.
    LedgerCredited {
        session_id: Uuid,
        user_id: String,
        minutes: f64,
        total_minutes: f64,
        at: DateTime<Utc>,
    },
    /// The ledger increment failed. The session stays completed; retrying
    /// the credit is the store's concern, not the timer's.
    LedgerUpdateFailed {
        session_id: Uuid,
        user_id: String,
        minutes: f64,
        message: String,
        at: DateTime<Utc>,
    },
    /// Point-in-time view of the timer, produced on demand.
    StateSnapshot {
        status: SessionStatus,
        session_id: Option<Uuid>,
        target_secs: u64,
        elapsed_secs: u64,
        remaining_secs: u64,
        /// Progress toward the target in `0.0..=1.0`.
        progress: f64,
        at: DateTime<Utc>,
    },
}
