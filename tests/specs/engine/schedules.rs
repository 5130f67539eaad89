//! Schedule lifecycle specs
//!
//! A schedule becomes a stored trigger, fires through the executor when
//! due, and is rearmed, paused or forgotten depending on its shape.

use crate::prelude::*;
use cadence_core::{Clock, FakeClock, Recurrence, TriggerStatus};
use std::time::Duration;
use tempfile::tempdir;

#[tokio::test]
async fn scheduled_flow_runs_and_rearms() {
    let dir = tempdir().unwrap();
    let clock = FakeClock::new();
    let engine = Engine::open(dir.path(), &clock, false);
    let stored = engine
        .schedules
        .schedule_flow(hourly(&clock, "nightly"))
        .await
        .unwrap();
    let first = stored.next_exec_time;

    assert_eq!(engine.triggers.scan_once().await.fired, 0);
    assert!(engine.executor.requests().is_empty());

    clock.advance(Duration::from_secs(3_601));
    assert_eq!(engine.triggers.scan_once().await.fired, 1);

    let requests = engine.executor.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].project_id, 42);
    assert_eq!(requests[0].flow_id, "nightly");
    assert_eq!(requests[0].submit_user, "alice");

    let current = engine
        .schedules
        .get_schedule(stored.schedule_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(current.next_exec_time, first + HOUR_MS);
    assert_eq!(current.status, TriggerStatus::Ready);
}

#[tokio::test]
async fn schedules_survive_restart() {
    let dir = tempdir().unwrap();
    let clock = FakeClock::new();
    let stored = Engine::open(dir.path(), &clock, false)
        .schedules
        .schedule_flow(hourly(&clock, "nightly"))
        .await
        .unwrap();

    let engine = Engine::open(dir.path(), &clock, false);
    engine.triggers.start().await.unwrap();
    assert_eq!(engine.schedules.load().await, 1);

    let reloaded = engine
        .schedules
        .get_schedule_by_flow(42, "nightly")
        .await
        .unwrap()
        .unwrap();
    similar_asserts::assert_eq!(reloaded, stored);
    engine.stop().await;
}

#[tokio::test]
async fn one_shot_runs_once_and_is_forgotten() {
    let dir = tempdir().unwrap();
    let clock = FakeClock::new();
    let engine = Engine::open(dir.path(), &clock, false);
    let mut once = hourly(&clock, "backfill");
    once.recurrence = Recurrence::Once;
    once.first_sched_time = clock.epoch_ms() + 60_000;
    once.next_exec_time = once.first_sched_time;
    engine.schedules.schedule_flow(once).await.unwrap();

    clock.advance(Duration::from_secs(120));
    let report = engine.triggers.scan_once().await;
    assert_eq!(report.fired, 1);
    assert_eq!(report.removed, 1);

    let records = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(Result::ok)
        .filter(|e| e.path().extension().is_some_and(|x| x == "trigger"))
        .count();
    assert_eq!(records, 0);
    assert!(engine.schedules.get_schedules().await.is_empty());

    clock.advance(Duration::from_secs(3_600));
    engine.triggers.scan_once().await;
    assert_eq!(engine.executor.requests().len(), 1);
}

#[tokio::test]
async fn end_time_pauses_the_schedule() {
    let dir = tempdir().unwrap();
    let clock = FakeClock::new();
    let engine = Engine::open(dir.path(), &clock, false);
    let mut schedule = hourly(&clock, "nightly");
    schedule.end_sched_time = schedule.first_sched_time + HOUR_MS + HOUR_MS / 2;
    let stored = engine.schedules.schedule_flow(schedule).await.unwrap();

    clock.advance(Duration::from_secs(3_601));
    assert_eq!(engine.triggers.scan_once().await.fired, 1);

    clock.advance(Duration::from_secs(2 * 3_600));
    let report = engine.triggers.scan_once().await;
    assert_eq!(report.paused, 1);
    assert_eq!(report.fired, 0);
    assert_eq!(engine.executor.requests().len(), 1);

    let current = engine
        .schedules
        .get_schedule(stored.schedule_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(current.status, TriggerStatus::Paused);
}
