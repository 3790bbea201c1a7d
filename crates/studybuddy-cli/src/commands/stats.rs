//! Statistics commands.

use std::error::Error;

use clap::Subcommand;
use studybuddy_core::storage::Database;
use studybuddy_core::{rank_by_minutes, Config};

#[derive(Subcommand)]
pub enum StatsAction {
    /// Today's sessions and minutes
    Today {
        #[arg(long)]
        user: Option<String>,
    },
    /// All-time statistics
    All {
        #[arg(long)]
        user: Option<String>,
    },
    /// Buddy leaderboard by accumulated minutes
    Leaderboard,
    /// Recent completed sessions, newest first
    Recent {
        #[arg(long)]
        user: Option<String>,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
}

pub fn run(action: StatsAction) -> Result<(), Box<dyn Error>> {
    let db = Database::open()?;
    let config = Config::load_or_default();
    let resolve = |user: Option<String>| user.unwrap_or_else(|| config.profile.user_id.clone());

    match action {
        StatsAction::Today { user } => {
            let stats = db.stats(&resolve(user))?;
            let today = serde_json::json!({
                "today_sessions": stats.today_sessions,
                "today_minutes": stats.today_minutes,
            });
            println!("{}", serde_json::to_string_pretty(&today)?);
        }
        StatsAction::All { user } => {
            let stats = db.stats(&resolve(user))?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        StatsAction::Leaderboard => {
            let ranked = rank_by_minutes(db.study_totals()?);
            println!("{}", serde_json::to_string_pretty(&ranked)?);
        }
        StatsAction::Recent { user, limit } => {
            let records = db.recent_sessions(&resolve(user), limit)?;
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
    }
    Ok(())
}
