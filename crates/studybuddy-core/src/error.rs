//! Core error types for studybuddy-core.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for studybuddy-core.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Timer error: {0}")]
    Timer(#[from] TimerError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Custom(String),
}

/// Session timer errors. Every one of these is raised before any state
/// change, so a failed call leaves the timer exactly as it was.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerError {
    /// The requested session duration was zero or otherwise unusable.
    #[error("invalid session duration: {seconds}s (must be positive)")]
    InvalidDuration { seconds: u64 },

    /// `start` was called while a session is already running.
    #[error("a study session is already running")]
    ReentrantStart,
}

/// Study ledger (SQLite) errors.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Failed to open ledger at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Failed to prepare data directory: {0}")]
    DataDir(#[from] std::io::Error),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Ledger migration failed: {0}")]
    MigrationFailed(String),

    #[error("Ledger database is locked")]
    Locked,
}

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

impl From<rusqlite::Error> for LedgerError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(inner, _msg) => {
                if inner.code == rusqlite::ErrorCode::DatabaseBusy
                    || inner.code == rusqlite::ErrorCode::DatabaseLocked
                {
                    LedgerError::Locked
                } else {
                    LedgerError::QueryFailed(err.to_string())
                }
            }
            _ => LedgerError::QueryFailed(err.to_string()),
        }
    }
}

/// Result type alias defaulting to [`CoreError`].
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timer_errors_render_for_users() {
        let e = TimerError::InvalidDuration { seconds: 0 };
        assert_eq!(e.to_string(), "invalid session duration: 0s (must be positive)");
        assert_eq!(
            TimerError::ReentrantStart.to_string(),
            "a study session is already running"
        );
    }

    #[test]
    fn sqlite_busy_maps_to_locked() {
        let err = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY),
            None,
        );
        assert!(matches!(LedgerError::from(err), LedgerError::Locked));
    }

    #[test]
    fn core_error_wraps_timer_error() {
        let e: CoreError = TimerError::ReentrantStart.into();
        assert!(matches!(e, CoreError::Timer(TimerError::ReentrantStart)));
    }
}
