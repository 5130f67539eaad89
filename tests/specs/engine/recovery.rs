//! Missed-schedule recovery specs
//!
//! Fire times that pass while no engine is running are reported on the
//! next start: owners are notified and, when asked for, the flow is run
//! once to catch up.

use crate::prelude::*;
use cadence_core::{Clock, FakeClock};
use cadence_engine::MISSED_SCHEDULE_SUBJECT;
use std::time::Duration;
use tempfile::tempdir;

/// Schedule an hourly flow, then let three and a half hours pass with no
/// engine running.
async fn schedule_then_downtime(dir: &std::path::Path, clock: &FakeClock, back_execute: bool) -> i64 {
    let mut schedule = hourly(clock, "nightly");
    schedule.back_execute_once_on_miss = back_execute;
    let stored = Engine::open(dir, clock, false)
        .schedules
        .schedule_flow(schedule)
        .await
        .unwrap();
    clock.advance(Duration::from_secs(3 * 3_600 + 1_800));
    stored.next_exec_time
}

#[tokio::test(start_paused = true)]
async fn downtime_misses_are_notified_and_back_executed() {
    let dir = tempdir().unwrap();
    let clock = FakeClock::new();
    schedule_then_downtime(dir.path(), &clock, true).await;

    let engine = Engine::open(dir.path(), &clock, true);
    engine.missed.start();
    engine.triggers.start().await.unwrap();
    tokio::time::sleep(Duration::from_millis(500)).await;

    let calls = engine.notifier.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].recipients, vec!["owners@example.com".to_string()]);
    assert_eq!(calls[0].subject, MISSED_SCHEDULE_SUBJECT);
    assert!(calls[0].body.contains(
        "2026-01-01T01:00:00.000Z,2026-01-01T02:00:00.000Z,2026-01-01T03:00:00.000Z"
    ));
    assert!(calls[0].body.contains("Back execution will start soon"));

    let requests = engine.executor.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].flow_id, "nightly");

    let stats = engine.missed.stats();
    assert_eq!(stats.missed_schedules, 3);
    assert_eq!(stats.back_executions, 1);
    engine.stop().await;
}

#[tokio::test(start_paused = true)]
async fn disabled_recovery_skips_ahead_quietly() {
    let dir = tempdir().unwrap();
    let clock = FakeClock::new();
    let first = schedule_then_downtime(dir.path(), &clock, true).await;

    let engine = Engine::open(dir.path(), &clock, false);
    engine.triggers.start().await.unwrap();
    tokio::time::sleep(Duration::from_millis(500)).await;

    assert!(engine.notifier.calls().is_empty());
    assert!(engine.executor.requests().is_empty());
    let schedule = engine
        .schedules
        .get_schedules()
        .await
        .pop()
        .unwrap();
    assert_eq!(schedule.next_exec_time, first + 3 * HOUR_MS);
    assert!(schedule.next_exec_time > clock.epoch_ms());
    engine.stop().await;
}
