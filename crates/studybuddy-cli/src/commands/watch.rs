//! Foreground session runner.
//!
//! Spawns the serialized session service on a local runtime and streams its
//! events to stdout as JSON lines until the session reaches an outcome.

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use studybuddy_core::storage::Database;
use studybuddy_core::{
    Config, Event, SessionService, SessionTracker, SystemClock, DEFAULT_TICK_INTERVAL,
};

#[derive(Args)]
pub struct WatchArgs {
    /// Target duration in minutes (defaults to session.default_target_min)
    #[arg(long)]
    minutes: Option<u64>,
    /// User to credit (defaults to profile.user_id)
    #[arg(long)]
    user: Option<String>,
}

pub fn run(args: WatchArgs) -> Result<(), Box<dyn Error>> {
    let config = Config::load_or_default();
    let user = args.user.unwrap_or_else(|| config.profile.user_id.clone());
    let minutes = args.minutes.unwrap_or(config.session.default_target_min);
    let tick = tick_duration(config.session.tick_interval_ms);

    let store = Box::new(Database::open()?);
    let tracker = SessionTracker::new(Arc::new(SystemClock), user);

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async move {
        let (handle, mut events) = SessionService::spawn(tracker, store, tick);
        handle.start(minutes.saturating_mul(60)).await?;

        while let Some(event) = events.recv().await {
            println!("{}", serde_json::to_string(&event)?);
            if matches!(
                event,
                Event::LedgerCredited { .. }
                    | Event::LedgerUpdateFailed { .. }
                    | Event::SessionAbandoned { .. }
            ) {
                break;
            }
        }
        Ok::<(), Box<dyn Error>>(())
    })?;
    Ok(())
}

/// Tick cadence from the configured milliseconds. Zero means unset and
/// falls back to the runner's default; anything below 100 ms is raised to
/// 100 ms.
fn tick_duration(tick_interval_ms: u64) -> Duration {
    match tick_interval_ms {
        0 => DEFAULT_TICK_INTERVAL,
        ms => Duration::from_millis(ms.max(100)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_duration_clamps_and_falls_back() {
        assert_eq!(tick_duration(0), DEFAULT_TICK_INTERVAL);
        assert_eq!(tick_duration(50), Duration::from_millis(100));
        assert_eq!(tick_duration(1_000), Duration::from_millis(1_000));
    }
}
