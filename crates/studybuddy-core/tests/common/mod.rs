//! Shared test fixtures.
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use studybuddy_core::{LedgerError, StudyStore};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct Credit {
    pub user_id: String,
    pub session_id: Uuid,
    pub minutes: f64,
}

/// Thread-safe in-memory store that records every credit attempt.
#[derive(Clone, Default)]
pub struct RecordingStore(Arc<Inner>);

#[derive(Default)]
struct Inner {
    credits: Mutex<Vec<Credit>>,
    fail: AtomicBool,
}

impl RecordingStore {
    pub fn failing() -> Self {
        let store = Self::default();
        store.set_fail(true);
        store
    }

    pub fn set_fail(&self, fail: bool) {
        self.0.fail.store(fail, Ordering::SeqCst);
    }

    pub fn credits(&self) -> Vec<Credit> {
        self.0.credits.lock().unwrap().clone()
    }

    pub fn credit_count(&self) -> usize {
        self.0.credits.lock().unwrap().len()
    }
}

impl StudyStore for RecordingStore {
    fn increment_study_minutes(
        &self,
        user_id: &str,
        session_id: Uuid,
        minutes: f64,
    ) -> Result<f64, LedgerError> {
        let mut credits = self.0.credits.lock().unwrap();
        credits.push(Credit {
            user_id: user_id.to_string(),
            session_id,
            minutes,
        });
        if self.0.fail.load(Ordering::SeqCst) {
            Err(LedgerError::QueryFailed("ledger unavailable".into()))
        } else {
            Ok(credits.iter().map(|c| c.minutes).sum())
        }
    }
}
