//! # StudyBuddy Core Library
//!
//! Core logic for StudyBuddy's study-session tracking: a wall-clock session
//! timer that survives host lifecycle churn, a SQLite ledger of accumulated
//! study minutes, and the statistics fed by it. The mobile app and the CLI
//! are thin shells over this crate.
//!
//! ## Architecture
//!
//! - **Session timer**: a state machine over wall-clock deltas; callers (or
//!   the bundled runner) drive [`SessionTimer::tick`] on a cadence
//! - **Runner**: one tokio task serializing commands, lifecycle signals and
//!   the tick cadence
//! - **Storage**: the SQLite study ledger and TOML configuration
//! - **Stats**: per-user totals and the buddy leaderboard
//!
//! ## Key components
//!
//! - [`SessionTimer`]: the state machine itself
//! - [`SessionTracker`]: timer + clock + ledger credit glue
//! - [`SessionService`]: the serialized async driver
//! - [`Database`]: ledger persistence
//! - [`Config`]: application configuration

pub mod clock;
pub mod error;
pub mod events;
pub mod session;
pub mod stats;
pub mod storage;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{ConfigError, CoreError, LedgerError, TimerError};
pub use events::Event;
pub use session::{
    AbandonReason, AppLifecycle, SessionHandle, SessionService, SessionStatus, SessionTimer,
    SessionTracker, DEFAULT_TICK_INTERVAL,
};
pub use stats::{rank_by_minutes, LeaderboardEntry};
pub use storage::{Config, Database, SessionRecord, Stats, StudyStore};
