//! Clock abstraction for the session timer.
//!
//! The timer operates on wall-clock deltas and never sleeps on its own, so
//! time enters the core through this trait only. [`SystemClock`] is the
//! production implementation; [`ManualClock`] lets tests and simulations
//! move time by hand.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};

/// Supplies the current time as epoch milliseconds.
///
/// Implementations must be consistent across process suspension: two reads
/// straddling a suspension report the full wall-clock gap between them.
pub trait Clock: Send + Sync {
    /// Current time in milliseconds since the Unix epoch.
    fn now_ms(&self) -> u64;

    /// Current time as a UTC timestamp, derived from [`Clock::now_ms`].
    fn now(&self) -> DateTime<Utc> {
        epoch_ms_to_utc(self.now_ms())
    }
}

/// Wall-clock time from the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }
}

/// Hand-driven clock. Starts wherever it is told to and only moves when
/// advanced, which makes every timed assertion deterministic.
#[derive(Debug, Default)]
pub struct ManualClock {
    ms: AtomicU64,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            ms: AtomicU64::new(start_ms),
        }
    }

    /// Move the clock forward by `delta_ms` milliseconds.
    pub fn advance(&self, delta_ms: u64) {
        self.ms.fetch_add(delta_ms, Ordering::SeqCst);
    }

    /// Move the clock forward by whole seconds.
    pub fn advance_secs(&self, secs: u64) {
        self.advance(secs.saturating_mul(1000));
    }

    pub fn set(&self, ms: u64) {
        self.ms.store(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.ms.load(Ordering::SeqCst)
    }
}

/// Convert epoch milliseconds to a UTC timestamp.
pub(crate) fn epoch_ms_to_utc(ms: u64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp_millis(ms as i64).unwrap_or_else(Utc::now)
}
