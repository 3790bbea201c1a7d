//! Persistence: the SQLite study ledger and TOML configuration.

pub mod config;
pub mod database;

pub use config::Config;
pub use database::{Database, SessionRecord, Stats};

use std::path::PathBuf;

use uuid::Uuid;

use crate::error::LedgerError;

/// Durable store of accumulated study minutes per user.
///
/// `session_id` is the deduplication key: a store that honors it makes the
/// increment idempotent, so replaying a credit after a reported failure can
/// never double count.
pub trait StudyStore: Send {
    /// Add `minutes` to `user_id`'s running total and return the new total.
    fn increment_study_minutes(
        &self,
        user_id: &str,
        session_id: Uuid,
        minutes: f64,
    ) -> Result<f64, LedgerError>;
}

/// Returns the application data directory, creating it if needed.
///
/// `STUDYBUDDY_DATA_DIR` overrides the location outright. Otherwise this is
/// `~/.config/studybuddy/`, or `~/.config/studybuddy-dev/` when
/// `STUDYBUDDY_ENV=dev`.
pub fn data_dir() -> Result<PathBuf, std::io::Error> {
    if let Ok(dir) = std::env::var("STUDYBUDDY_DATA_DIR") {
        let dir = PathBuf::from(dir);
        std::fs::create_dir_all(&dir)?;
        return Ok(dir);
    }

    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("STUDYBUDDY_ENV").unwrap_or_else(|_| "production".to_string());
    let dir = if env == "dev" {
        base_dir.join("studybuddy-dev")
    } else {
        base_dir.join("studybuddy")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    // No other unit test touches the environment, so no races here.
    #[test]
    fn data_dir_override_wins_and_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested");

        std::env::set_var("STUDYBUDDY_DATA_DIR", &target);
        let resolved = data_dir();
        std::env::remove_var("STUDYBUDDY_DATA_DIR");

        assert_eq!(resolved.unwrap(), target);
        assert!(target.is_dir());
    }
}
