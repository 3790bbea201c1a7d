//! Serialized runner loop tests, driven entirely on paused tokio time and a
//! manual wall clock.

mod common;

use std::sync::Arc;
use std::time::Duration;

use studybuddy_core::{
    AppLifecycle, CoreError, Event, ManualClock, SessionHandle, SessionService, SessionStatus,
    SessionTracker, TimerError,
};
use tokio::sync::mpsc;

use common::RecordingStore;

const TICK: Duration = Duration::from_millis(10);

fn spawn_service(
    clock: &Arc<ManualClock>,
    store: &RecordingStore,
) -> (SessionHandle, mpsc::Receiver<Event>) {
    let tracker = SessionTracker::new(clock.clone(), "amelia");
    SessionService::spawn(tracker, Box::new(store.clone()), TICK)
}

async fn wait_for<F>(events: &mut mpsc::Receiver<Event>, mut pred: F) -> Event
where
    F: FnMut(&Event) -> bool,
{
    tokio::time::timeout(Duration::from_secs(30), async {
        loop {
            match events.recv().await {
                Some(event) if pred(&event) => return event,
                Some(_) => continue,
                None => panic!("event stream closed while waiting"),
            }
        }
    })
    .await
    .expect("timed out waiting for event")
}

async fn assert_quiet(events: &mut mpsc::Receiver<Event>) {
    let res = tokio::time::timeout(Duration::from_millis(200), events.recv()).await;
    assert!(res.is_err(), "unexpected event: {res:?}");
}

#[tokio::test(start_paused = true)]
async fn completes_and_credits_through_the_loop() {
    let clock = Arc::new(ManualClock::new(1_000));
    let store = RecordingStore::default();
    let (handle, mut events) = spawn_service(&clock, &store);

    handle.start(60).await.unwrap();
    clock.advance_secs(60);

    wait_for(&mut events, |e| matches!(e, Event::SessionStarted { .. })).await;
    let completed = wait_for(&mut events, |e| matches!(e, Event::SessionCompleted { .. })).await;
    match completed {
        Event::SessionCompleted { credited_min, .. } => assert_eq!(credited_min, 1.0),
        other => panic!("unexpected event: {other:?}"),
    }
    let credited = wait_for(&mut events, |e| matches!(e, Event::LedgerCredited { .. })).await;
    match credited {
        Event::LedgerCredited { total_minutes, .. } => assert_eq!(total_minutes, 1.0),
        other => panic!("unexpected event: {other:?}"),
    }

    assert_eq!(store.credit_count(), 1);

    // Completion parks the cadence; nothing further is emitted.
    clock.advance_secs(600);
    assert_quiet(&mut events).await;
}

#[tokio::test(start_paused = true)]
async fn backgrounding_abandons_and_surfaces_notice_on_return() {
    let clock = Arc::new(ManualClock::new(0));
    let store = RecordingStore::default();
    let (handle, mut events) = spawn_service(&clock, &store);

    handle.start(600).await.unwrap();
    clock.advance_secs(300);
    handle.lifecycle(AppLifecycle::Background).await;

    let abandoned = wait_for(&mut events, |e| matches!(e, Event::SessionAbandoned { .. })).await;
    match abandoned {
        Event::SessionAbandoned { elapsed_secs, .. } => assert_eq!(elapsed_secs, 300),
        other => panic!("unexpected event: {other:?}"),
    }

    // A long suspension passes; the outcome must stay an abandonment.
    clock.advance_secs(5_000);
    handle.lifecycle(AppLifecycle::Active).await;
    wait_for(&mut events, |e| matches!(e, Event::AbandonmentNotice { .. })).await;

    match handle.snapshot().await {
        Some(Event::StateSnapshot { status, .. }) => {
            assert_eq!(status, SessionStatus::Abandoned)
        }
        other => panic!("unexpected snapshot: {other:?}"),
    }
    assert_eq!(store.credit_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn reentrant_start_is_rejected_over_the_handle() {
    let clock = Arc::new(ManualClock::new(0));
    let store = RecordingStore::default();
    let (handle, mut events) = spawn_service(&clock, &store);

    handle.start(300).await.unwrap();
    let err = handle.start(600).await.unwrap_err();
    assert!(matches!(
        err,
        CoreError::Timer(TimerError::ReentrantStart)
    ));

    // The original session is unaffected.
    clock.advance_secs(300);
    wait_for(&mut events, |e| matches!(e, Event::SessionCompleted { .. })).await;
}

#[tokio::test(start_paused = true)]
async fn zero_duration_start_is_rejected() {
    let clock = Arc::new(ManualClock::new(0));
    let store = RecordingStore::default();
    let (handle, _events) = spawn_service(&clock, &store);

    let err = handle.start(0).await.unwrap_err();
    assert!(matches!(
        err,
        CoreError::Timer(TimerError::InvalidDuration { seconds: 0 })
    ));
}

#[tokio::test(start_paused = true)]
async fn cancel_then_acknowledge_returns_to_idle() {
    let clock = Arc::new(ManualClock::new(0));
    let store = RecordingStore::default();
    let (handle, mut events) = spawn_service(&clock, &store);

    handle.start(300).await.unwrap();
    clock.advance_secs(120);
    handle.cancel().await;
    wait_for(&mut events, |e| matches!(e, Event::SessionAbandoned { .. })).await;

    handle.acknowledge().await;
    wait_for(&mut events, |e| matches!(e, Event::SessionAcknowledged { .. })).await;

    match handle.snapshot().await {
        Some(Event::StateSnapshot { status, .. }) => assert_eq!(status, SessionStatus::Idle),
        other => panic!("unexpected snapshot: {other:?}"),
    }
    assert_eq!(store.credit_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn dropping_every_handle_stops_the_service() {
    let clock = Arc::new(ManualClock::new(0));
    let store = RecordingStore::default();
    let (handle, mut events) = spawn_service(&clock, &store);

    handle.start(60).await.unwrap();
    drop(handle);

    // The loop drains and the event stream closes.
    loop {
        match tokio::time::timeout(Duration::from_secs(30), events.recv()).await {
            Ok(Some(_)) => continue,
            Ok(None) => break,
            Err(_) => panic!("service did not stop"),
        }
    }
}
