//! Trigger record specs
//!
//! Each trigger is one `<id>.trigger` file: a JSON header line followed by
//! the encoded trigger document.

use crate::prelude::*;
use cadence_core::FakeClock;
use tempfile::tempdir;

#[tokio::test]
async fn record_header_names_the_trigger() {
    let dir = tempdir().unwrap();
    let clock = FakeClock::new();
    let engine = Engine::open(dir.path(), &clock, false);
    let stored = engine
        .schedules
        .schedule_flow(hourly(&clock, "nightly"))
        .await
        .unwrap();

    let path = dir.path().join(format!("{}.trigger", stored.schedule_id));
    let bytes = std::fs::read(&path).unwrap();
    let newline = bytes.iter().position(|b| *b == b'\n').unwrap();
    let header: serde_json::Value = serde_json::from_slice(&bytes[..newline]).unwrap();

    similar_asserts::assert_eq!(
        header,
        serde_json::json!({
            "id": stored.schedule_id.0,
            "source": "SimpleTimeTrigger",
            "modifyTime": stored.last_modify_time,
            "encoding": "zstd",
        })
    );
}

#[tokio::test]
async fn unreadable_records_are_set_aside() {
    let dir = tempdir().unwrap();
    let clock = FakeClock::new();
    let stored = Engine::open(dir.path(), &clock, false)
        .schedules
        .schedule_flow(hourly(&clock, "nightly"))
        .await
        .unwrap();
    std::fs::write(dir.path().join("99.trigger"), b"not a record").unwrap();

    let engine = Engine::open(dir.path(), &clock, false);
    engine.triggers.start().await.unwrap();
    let triggers = engine.triggers.get_triggers().await;
    assert_eq!(triggers.len(), 1);
    assert_eq!(triggers[0].id(), stored.schedule_id);
    assert!(dir.path().join("99.bak").exists());
    engine.stop().await;
}
