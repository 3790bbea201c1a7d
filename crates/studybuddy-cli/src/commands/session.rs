//! Session commands.
//!
//! The CLI is a stateless front: the timer state machine is serialized into
//! the ledger's kv table between invocations, and every command rebuilds a
//! tracker around it. `status` doubles as the tick driver, so a completed
//! target is detected (and credited) the next time anyone looks.

use std::error::Error;
use std::sync::Arc;

use clap::Subcommand;
use studybuddy_core::storage::Database;
use studybuddy_core::{
    AppLifecycle, Config, SessionTimer, SessionTracker, SystemClock, TimerError,
};

const TIMER_KEY: &str = "session_timer";
const LIFECYCLE_KEY: &str = "host_lifecycle";
const USER_KEY: &str = "session_user";

#[derive(Subcommand)]
pub enum SessionAction {
    /// Start a study session
    Start {
        /// Target duration in minutes
        #[arg(long, conflicts_with = "seconds")]
        minutes: Option<u64>,
        /// Target duration in seconds
        #[arg(long)]
        seconds: Option<u64>,
        /// User to credit (defaults to profile.user_id)
        #[arg(long)]
        user: Option<String>,
    },
    /// Tick the timer and print the current state as JSON
    Status,
    /// Abandon the running session
    Cancel,
    /// Acknowledge a completed or abandoned session
    Ack,
    /// Report a host lifecycle transition
    Lifecycle {
        /// New state: active, inactive or background
        to: AppLifecycle,
    },
}

pub fn run(action: SessionAction) -> Result<(), Box<dyn Error>> {
    let db = Database::open()?;
    let config = Config::load_or_default();

    match action {
        SessionAction::Start {
            minutes,
            seconds,
            user,
        } => {
            let target_secs = seconds.unwrap_or_else(|| {
                minutes
                    .unwrap_or(config.session.default_target_min)
                    .saturating_mul(60)
            });
            let user = user.unwrap_or_else(|| config.profile.user_id.clone());
            let mut tracker = load_tracker(&db, &config, Some(user.clone()));

            match tracker.start(target_secs) {
                Ok(event) => {
                    db.kv_set(USER_KEY, &user)?;
                    print_event(&event)?;
                }
                Err(TimerError::ReentrantStart) => {
                    tracing::warn!("start ignored: a session is already running");
                    print_event(&tracker.snapshot())?;
                }
                Err(e) => return Err(e.into()),
            }
            save_timer(&db, tracker.into_timer())?;
        }
        SessionAction::Status => {
            let mut tracker = load_tracker(&db, &config, None);
            for event in tracker.tick(&db) {
                print_event(&event)?;
            }
            print_event(&tracker.snapshot())?;
            save_timer(&db, tracker.into_timer())?;
        }
        SessionAction::Cancel => {
            let mut tracker = load_tracker(&db, &config, None);
            match tracker.cancel() {
                Some(event) => print_event(&event)?,
                None => println!("no running session"),
            }
            save_timer(&db, tracker.into_timer())?;
        }
        SessionAction::Ack => {
            let mut tracker = load_tracker(&db, &config, None);
            match tracker.acknowledge() {
                Some(event) => print_event(&event)?,
                None => println!("nothing to acknowledge"),
            }
            save_timer(&db, tracker.into_timer())?;
        }
        SessionAction::Lifecycle { to } => {
            let mut tracker = load_tracker(&db, &config, None);
            for event in tracker.apply_lifecycle(to) {
                print_event(&event)?;
            }
            db.kv_set(LIFECYCLE_KEY, to.as_str())?;
            save_timer(&db, tracker.into_timer())?;
        }
    }
    Ok(())
}

/// Rebuild the tracker from persisted state. `user_override` wins over the
/// user recorded at start time, which wins over the profile default.
fn load_tracker(db: &Database, config: &Config, user_override: Option<String>) -> SessionTracker {
    let timer = db
        .kv_get(TIMER_KEY)
        .ok()
        .flatten()
        .and_then(|json| serde_json::from_str::<SessionTimer>(&json).ok())
        .unwrap_or_default();

    let lifecycle = db
        .kv_get(LIFECYCLE_KEY)
        .ok()
        .flatten()
        .and_then(|s| s.parse().ok())
        .unwrap_or(AppLifecycle::Active);

    let user = user_override
        .or_else(|| db.kv_get(USER_KEY).ok().flatten())
        .unwrap_or_else(|| config.profile.user_id.clone());

    SessionTracker::from_parts(timer, lifecycle, Arc::new(SystemClock), user)
}

fn save_timer(db: &Database, timer: SessionTimer) -> Result<(), Box<dyn Error>> {
    db.kv_set(TIMER_KEY, &serde_json::to_string(&timer)?)?;
    Ok(())
}

fn print_event(event: &studybuddy_core::Event) -> Result<(), Box<dyn Error>> {
    println!("{}", serde_json::to_string_pretty(event)?);
    Ok(())
}
