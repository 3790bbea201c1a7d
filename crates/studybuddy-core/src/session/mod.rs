//! Study session tracking: state machine, lifecycle handling and the
//! serialized async driver.

mod engine;
mod lifecycle;
mod runner;
mod tracker;

pub use engine::{AbandonReason, SessionStatus, SessionTimer};
pub use lifecycle::{AppLifecycle, ParseLifecycleError};
pub use runner::{SessionHandle, SessionService, DEFAULT_TICK_INTERVAL};
pub use tracker::SessionTracker;
