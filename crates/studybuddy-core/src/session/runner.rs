//! Serialized session event loop.
//!
//! One tokio task owns the tracker and the store. Commands, lifecycle
//! signals and the tick cadence are multiplexed through a single `select!`,
//! so no two transitions ever interleave and every tick observes a settled
//! state. The cadence only exists while a session is running.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::{interval, Interval, MissedTickBehavior};

use crate::error::{CoreError, TimerError};
use crate::events::Event;
use crate::session::lifecycle::AppLifecycle;
use crate::session::tracker::SessionTracker;
use crate::storage::StudyStore;

/// Default wall-clock tick cadence.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

enum Command {
    Start {
        target_secs: u64,
        reply: oneshot::Sender<Result<(), TimerError>>,
    },
    Cancel,
    Acknowledge,
    Lifecycle(AppLifecycle),
    Snapshot {
        reply: oneshot::Sender<Event>,
    },
}

enum Input {
    Command(Option<Command>),
    Tick,
}

/// Handle to a spawned [`SessionService`]. Cheap to clone; the service
/// stops once every handle is dropped.
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<Command>,
}

impl SessionHandle {
    /// Start a session of `target_secs`.
    ///
    /// Rejections surface here; a reentrant start is also logged by the
    /// service and leaves the running session untouched.
    pub async fn start(&self, target_secs: u64) -> Result<(), CoreError> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(Command::Start {
                target_secs,
                reply: tx,
            })
            .await
            .map_err(|_| service_stopped())?;
        rx.await.map_err(|_| service_stopped())?.map_err(CoreError::from)
    }

    pub async fn cancel(&self) {
        let _ = self.commands.send(Command::Cancel).await;
    }

    pub async fn acknowledge(&self) {
        let _ = self.commands.send(Command::Acknowledge).await;
    }

    /// Report a host lifecycle transition.
    pub async fn lifecycle(&self, to: AppLifecycle) {
        let _ = self.commands.send(Command::Lifecycle(to)).await;
    }

    /// Current timer state, or `None` if the service has stopped.
    pub async fn snapshot(&self) -> Option<Event> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(Command::Snapshot { reply: tx })
            .await
            .ok()?;
        rx.await.ok()
    }
}

fn service_stopped() -> CoreError {
    CoreError::Custom("session service stopped".to_string())
}

/// Spawns the session loop onto the current tokio runtime.
pub struct SessionService;

impl SessionService {
    /// Returns the command handle and the event stream. Events are emitted
    /// in transition order; a slow consumer loses events rather than
    /// stalling the loop.
    pub fn spawn(
        tracker: SessionTracker,
        store: Box<dyn StudyStore>,
        tick_interval: Duration,
    ) -> (SessionHandle, mpsc::Receiver<Event>) {
        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        let (event_tx, event_rx) = mpsc::channel(64);
        tokio::spawn(run_loop(tracker, store, tick_interval, cmd_rx, event_tx));
        (SessionHandle { commands: cmd_tx }, event_rx)
    }
}

async fn run_loop(
    mut tracker: SessionTracker,
    store: Box<dyn StudyStore>,
    tick_interval: Duration,
    mut commands: mpsc::Receiver<Command>,
    events: mpsc::Sender<Event>,
) {
    let mut ticker: Option<Interval> = None;

    loop {
        let input = match ticker.as_mut() {
            Some(t) => tokio::select! {
                cmd = commands.recv() => Input::Command(cmd),
                _ = t.tick() => Input::Tick,
            },
            None => Input::Command(commands.recv().await),
        };

        match input {
            Input::Command(None) => break,
            Input::Command(Some(cmd)) => {
                handle_command(cmd, &mut tracker, &events, &mut ticker, tick_interval);
            }
            Input::Tick => {
                for event in tracker.tick(store.as_ref()) {
                    forward(&events, event);
                }
                if !tracker.is_running() {
                    ticker = None;
                }
            }
        }
    }
    tracing::debug!("session service stopped");
}

fn handle_command(
    cmd: Command,
    tracker: &mut SessionTracker,
    events: &mpsc::Sender<Event>,
    ticker: &mut Option<Interval>,
    tick_interval: Duration,
) {
    match cmd {
        Command::Start { target_secs, reply } => match tracker.start(target_secs) {
            Ok(event) => {
                *ticker = Some(make_ticker(tick_interval));
                let _ = reply.send(Ok(()));
                forward(events, event);
            }
            Err(e) => {
                tracing::warn!(error = %e, "session start rejected");
                let _ = reply.send(Err(e));
            }
        },
        Command::Cancel => {
            if let Some(event) = tracker.cancel() {
                *ticker = None;
                forward(events, event);
            }
        }
        Command::Acknowledge => {
            if let Some(event) = tracker.acknowledge() {
                forward(events, event);
            }
        }
        Command::Lifecycle(to) => {
            let emitted = tracker.apply_lifecycle(to);
            if !tracker.is_running() {
                *ticker = None;
            }
            for event in emitted {
                forward(events, event);
            }
        }
        Command::Snapshot { reply } => {
            let _ = reply.send(tracker.snapshot());
        }
    }
}

fn make_ticker(period: Duration) -> Interval {
    let mut t = interval(period);
    t.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // interval() completes its first tick immediately; push it out so the
    // first elapsed reading lands one period after start.
    t.reset();
    t
}

fn forward(events: &mpsc::Sender<Event>, event: Event) {
    if let Err(e) = events.try_send(event) {
        tracing::debug!("session event dropped: {e}");
    }
}
