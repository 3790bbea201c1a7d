//! SQLite-backed study ledger.
//!
//! Persistent storage for:
//! - Accumulated study minutes per user (the ledger proper)
//! - Completed session records, keyed by session id for deduplication
//! - A key-value table for host state such as the persisted timer

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::LedgerError;
use crate::stats::LeaderboardEntry;
use crate::storage::{data_dir, StudyStore};

/// A completed session as recorded in the ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: Uuid,
    pub user_id: String,
    pub credited_min: f64,
    pub completed_at: DateTime<Utc>,
}

/// Per-user session statistics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Stats {
    pub total_sessions: u64,
    pub total_minutes: f64,
    pub today_sessions: u64,
    pub today_minutes: f64,
}

/// SQLite database holding the study ledger.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) the ledger in the application data directory.
    pub fn open() -> Result<Self, LedgerError> {
        let path = data_dir()?.join("studybuddy.db");
        let conn =
            Connection::open(&path).map_err(|source| LedgerError::OpenFailed { path, source })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// In-memory ledger for tests.
    pub fn open_memory() -> Result<Self, LedgerError> {
        let conn = Connection::open_in_memory().map_err(|source| LedgerError::OpenFailed {
            path: ":memory:".into(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), LedgerError> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS study_totals (
                    user_id       TEXT PRIMARY KEY,
                    total_minutes REAL NOT NULL DEFAULT 0
                );

                CREATE TABLE IF NOT EXISTS sessions (
                    id           TEXT PRIMARY KEY,
                    user_id      TEXT NOT NULL,
                    credited_min REAL NOT NULL,
                    completed_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS kv (
                    key   TEXT PRIMARY KEY,
                    value TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_sessions_user_id
                    ON sessions(user_id);
                CREATE INDEX IF NOT EXISTS idx_sessions_completed_at
                    ON sessions(completed_at);",
            )
            .map_err(|e| LedgerError::MigrationFailed(e.to_string()))
    }

    /// Record a session credit with an explicit completion timestamp and
    /// return the user's new total.
    ///
    /// The session id deduplicates replays: an id already on file leaves
    /// the total unchanged. Both writes happen in one transaction.
    pub fn credit(
        &self,
        user_id: &str,
        session_id: Uuid,
        minutes: f64,
        completed_at: DateTime<Utc>,
    ) -> Result<f64, LedgerError> {
        let tx = self.conn.unchecked_transaction()?;

        let inserted = tx.execute(
            "INSERT OR IGNORE INTO sessions (id, user_id, credited_min, completed_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                session_id.to_string(),
                user_id,
                minutes,
                completed_at.to_rfc3339()
            ],
        )?;

        if inserted > 0 {
            tx.execute(
                "INSERT INTO study_totals (user_id, total_minutes) VALUES (?1, ?2)
                 ON CONFLICT(user_id) DO UPDATE
                     SET total_minutes = total_minutes + excluded.total_minutes",
                params![user_id, minutes],
            )?;
        } else {
            tracing::debug!(%session_id, user_id, "duplicate session credit ignored");
        }

        let total = tx
            .query_row(
                "SELECT total_minutes FROM study_totals WHERE user_id = ?1",
                params![user_id],
                |row| row.get::<_, f64>(0),
            )
            .optional()?
            .unwrap_or(0.0);

        tx.commit()?;
        Ok(total)
    }

    /// Accumulated minutes for one user, zero if unknown.
    pub fn total_minutes(&self, user_id: &str) -> Result<f64, LedgerError> {
        let total = self
            .conn
            .query_row(
                "SELECT total_minutes FROM study_totals WHERE user_id = ?1",
                params![user_id],
                |row| row.get::<_, f64>(0),
            )
            .optional()?;
        Ok(total.unwrap_or(0.0))
    }

    /// All-time and today's session statistics for one user.
    pub fn stats(&self, user_id: &str) -> Result<Stats, LedgerError> {
        let (total_sessions, total_minutes) = self.conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(credited_min), 0)
             FROM sessions WHERE user_id = ?1",
            params![user_id],
            |row| Ok((row.get::<_, u64>(0)?, row.get::<_, f64>(1)?)),
        )?;

        let today = Utc::now().format("%Y-%m-%d").to_string();
        let (today_sessions, today_minutes) = self.conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(credited_min), 0)
             FROM sessions WHERE user_id = ?1 AND completed_at >= ?2",
            params![user_id, format!("{today}T00:00:00+00:00")],
            |row| Ok((row.get::<_, u64>(0)?, row.get::<_, f64>(1)?)),
        )?;

        Ok(Stats {
            total_sessions,
            total_minutes,
            today_sessions,
            today_minutes,
        })
    }

    /// Most recent completed sessions for one user, newest first.
    pub fn recent_sessions(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<SessionRecord>, LedgerError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, credited_min, completed_at
             FROM sessions WHERE user_id = ?1
             ORDER BY completed_at DESC LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![user_id, limit as i64], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, f64>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (id, user_id, credited_min, completed_at) = row?;
            records.push(SessionRecord {
                id: id
                    .parse()
                    .map_err(|e| LedgerError::QueryFailed(format!("bad session id: {e}")))?,
                user_id,
                credited_min,
                completed_at: DateTime::parse_from_rfc3339(&completed_at)
                    .map_err(|e| LedgerError::QueryFailed(format!("bad timestamp: {e}")))?
                    .with_timezone(&Utc),
            });
        }
        Ok(records)
    }

    /// Every user's accumulated minutes, unordered. Feed the result to
    /// [`crate::stats::rank_by_minutes`] for leaderboard order.
    pub fn study_totals(&self) -> Result<Vec<LeaderboardEntry>, LedgerError> {
        let mut stmt = self
            .conn
            .prepare("SELECT user_id, total_minutes FROM study_totals")?;
        let rows = stmt.query_map([], |row| {
            Ok(LeaderboardEntry {
                user_id: row.get(0)?,
                total_minutes: row.get(1)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn kv_get(&self, key: &str) -> Result<Option<String>, LedgerError> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv WHERE key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), LedgerError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn kv_delete(&self, key: &str) -> Result<(), LedgerError> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }
}

impl StudyStore for Database {
    fn increment_study_minutes(
        &self,
        user_id: &str,
        session_id: Uuid,
        minutes: f64,
    ) -> Result<f64, LedgerError> {
        self.credit(user_id, session_id, minutes, Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[test]
    fn credit_accumulates_per_user() {
        let db = Database::open_memory().unwrap();
        let total = db
            .increment_study_minutes("amelia", Uuid::new_v4(), 5.0)
            .unwrap();
        assert_eq!(total, 5.0);

        let total = db
            .increment_study_minutes("amelia", Uuid::new_v4(), 2.5)
            .unwrap();
        assert_eq!(total, 7.5);

        assert_eq!(db.total_minutes("amelia").unwrap(), 7.5);
        assert_eq!(db.total_minutes("someone-else").unwrap(), 0.0);
    }

    #[test]
    fn replayed_session_id_does_not_double_count() {
        let db = Database::open_memory().unwrap();
        let session = Uuid::new_v4();

        let total = db.increment_study_minutes("amelia", session, 5.0).unwrap();
        assert_eq!(total, 5.0);

        // Same session replayed, e.g. after a reported failure.
        let total = db.increment_study_minutes("amelia", session, 5.0).unwrap();
        assert_eq!(total, 5.0);

        let stats = db.stats("amelia").unwrap();
        assert_eq!(stats.total_sessions, 1);
        assert_eq!(stats.total_minutes, 5.0);
    }

    #[test]
    fn stats_split_today_from_all_time() {
        let db = Database::open_memory().unwrap();
        let now = Utc::now();

        db.credit("amelia", Uuid::new_v4(), 25.0, now - Duration::days(3))
            .unwrap();
        db.credit("amelia", Uuid::new_v4(), 5.0, now).unwrap();

        let stats = db.stats("amelia").unwrap();
        assert_eq!(stats.total_sessions, 2);
        assert_eq!(stats.total_minutes, 30.0);
        assert_eq!(stats.today_sessions, 1);
        assert_eq!(stats.today_minutes, 5.0);
    }

    #[test]
    fn recent_sessions_newest_first() {
        let db = Database::open_memory().unwrap();
        let now = Utc::now();

        db.credit("amelia", Uuid::new_v4(), 1.0, now - Duration::hours(2))
            .unwrap();
        db.credit("amelia", Uuid::new_v4(), 2.0, now - Duration::hours(1))
            .unwrap();
        db.credit("amelia", Uuid::new_v4(), 3.0, now).unwrap();
        db.credit("bryn", Uuid::new_v4(), 9.0, now).unwrap();

        let records = db.recent_sessions("amelia", 2).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].credited_min, 3.0);
        assert_eq!(records[1].credited_min, 2.0);
        assert!(records.iter().all(|r| r.user_id == "amelia"));
    }

    #[test]
    fn study_totals_lists_every_user() {
        let db = Database::open_memory().unwrap();
        db.increment_study_minutes("amelia", Uuid::new_v4(), 10.0)
            .unwrap();
        db.increment_study_minutes("bryn", Uuid::new_v4(), 4.0)
            .unwrap();

        let mut totals = db.study_totals().unwrap();
        totals.sort_by(|a, b| a.user_id.cmp(&b.user_id));
        assert_eq!(totals.len(), 2);
        assert_eq!(totals[0].user_id, "amelia");
        assert_eq!(totals[0].total_minutes, 10.0);
        assert_eq!(totals[1].user_id, "bryn");
    }

    #[test]
    fn kv_roundtrip() {
        let db = Database::open_memory().unwrap();
        assert_eq!(db.kv_get("session_timer").unwrap(), None);

        db.kv_set("session_timer", "{\"status\":\"idle\"}").unwrap();
        assert_eq!(
            db.kv_get("session_timer").unwrap().as_deref(),
            Some("{\"status\":\"idle\"}")
        );

        db.kv_set("session_timer", "{}").unwrap();
        assert_eq!(db.kv_get("session_timer").unwrap().as_deref(), Some("{}"));

        db.kv_delete("session_timer").unwrap();
        assert_eq!(db.kv_get("session_timer").unwrap(), None);
    }
}
