// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::{MemoryTriggerStore, StoreError, StoredTrigger};
use cadence_core::test_support::{register_test_types, FlagChecker, RecordingAction};
use cadence_core::{Clock, Condition, FakeClock, TriggerStatus};

struct Harness {
    store: MemoryTriggerStore,
    clock: FakeClock,
    loader: TriggerLoader,
}

fn harness() -> Harness {
    let store = MemoryTriggerStore::new();
    let clock = FakeClock::new();
    let registries = Arc::new(Registries::new());
    register_test_types(&registries);
    let loader = TriggerLoader::new(Arc::new(store.clone()), registries, clock.shared());
    Harness {
        store,
        clock,
        loader,
    }
}

fn flag_trigger(source: &str, next: i64) -> Trigger {
    let fire = FlagChecker::new("fire", false, next);
    let expire = FlagChecker::new("expire", false, i64::MAX - 1);
    Trigger::builder(
        Condition::new(vec![fire.boxed()], "fire.eval()").unwrap(),
        Condition::new(vec![expire.boxed()], "expire.eval()").unwrap(),
    )
    .source(source)
    .submit_user("alice")
    .action(RecordingAction::new("run").shared())
    .build()
}

#[test]
fn insert_assigns_id_and_stamps_modify_time() {
    let h = harness();
    let mut trigger = flag_trigger("schedule", 5_000);

    let id = h.loader.insert(&mut trigger).unwrap();
    assert_eq!(trigger.id(), id);
    assert_eq!(trigger.last_modify_time(), h.clock.epoch_ms());

    let loaded = h.loader.load(id).unwrap().unwrap();
    assert_eq!(loaded.id(), id);
    assert_eq!(loaded.source(), "schedule");
    assert_eq!(loaded.status(), TriggerStatus::Ready);
    assert_eq!(loaded.next_check_time(), 5_000);
    assert_eq!(loaded.actions().len(), 1);
}

#[test]
fn update_persists_changes() {
    let h = harness();
    let mut trigger = flag_trigger("schedule", 5_000);
    let id = h.loader.insert(&mut trigger).unwrap();

    h.clock.advance(std::time::Duration::from_secs(60));
    trigger.set_status(TriggerStatus::Paused);
    h.loader.update(&mut trigger).unwrap();

    let loaded = h.loader.load(id).unwrap().unwrap();
    assert_eq!(loaded.status(), TriggerStatus::Paused);
    assert_eq!(loaded.last_modify_time(), h.clock.epoch_ms());
}

#[test]
fn update_of_unknown_trigger_surfaces_no_rows_affected() {
    let h = harness();
    let mut trigger = flag_trigger("schedule", 5_000);
    trigger.set_id(TriggerId(77));
    let err = h.loader.update(&mut trigger).unwrap_err();
    assert!(matches!(
        err,
        LoaderError::Store(StoreError::NoRowsAffected { .. })
    ));
}

#[test]
fn load_all_skips_undecodable_records() {
    let h = harness();
    let mut good = flag_trigger("schedule", 5_000);
    h.loader.insert(&mut good).unwrap();

    let mut unknown = flag_trigger("schedule", 6_000);
    h.loader.insert(&mut unknown).unwrap();
    let mut doc = unknown.to_json().unwrap();
    doc["actions"][0]["type"] = "NoSuchAction".into();
    h.store.put_raw(StoredTrigger {
        id: unknown.id(),
        source: "schedule".to_string(),
        modify_time: 0,
        encoding: EncodingType::Plain,
        payload: serde_json::to_vec(&doc).unwrap(),
    });
    h.store.put_raw(StoredTrigger {
        id: TriggerId(50),
        source: "schedule".to_string(),
        modify_time: 0,
        encoding: EncodingType::Zstd,
        payload: b"garbage".to_vec(),
    });

    let loaded = h.loader.load_all().unwrap();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].id(), good.id());
}

#[test]
fn load_since_returns_recent_modifications() {
    let h = harness();
    let mut old = flag_trigger("schedule", 1_000);
    h.loader.insert(&mut old).unwrap();
    h.clock.advance(std::time::Duration::from_secs(10));
    let cutoff = h.clock.epoch_ms();
    let mut fresh = flag_trigger("other", 2_000);
    h.loader.insert(&mut fresh).unwrap();

    let recent = h.loader.load_since(cutoff).unwrap();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].id(), fresh.id());
}

#[test]
fn store_outage_is_an_error_not_an_empty_load() {
    let h = harness();
    h.store.set_unavailable(true);
    assert!(matches!(
        h.loader.load_all(),
        Err(LoaderError::Store(StoreError::Unavailable(_)))
    ));
}

#[test]
fn plain_encoding_is_readable() {
    let h = harness();
    let loader = h.loader.clone().with_encoding(EncodingType::Plain);
    let mut trigger = flag_trigger("schedule", 5_000);
    let id = loader.insert(&mut trigger).unwrap();

    let raw = h.store.load_all().unwrap();
    assert_eq!(raw[0].encoding, EncodingType::Plain);
    assert!(serde_json::from_slice::<serde_json::Value>(&raw[0].payload).is_ok());
    assert_eq!(h.loader.load(id).unwrap().unwrap().id(), id);
}

/// Store whose updates always fail; everything else reaches the memory store.
struct NoUpdates(MemoryTriggerStore);

impl TriggerStore for NoUpdates {
    fn load_all(&self) -> Result<Vec<StoredTrigger>, StoreError> {
        self.0.load_all()
    }

    fn load_since(&self, since: i64) -> Result<Vec<StoredTrigger>, StoreError> {
        self.0.load_since(since)
    }

    fn load(&self, id: TriggerId) -> Result<Option<StoredTrigger>, StoreError> {
        self.0.load(id)
    }

    fn insert(&self, record: StoredTrigger) -> Result<TriggerId, StoreError> {
        self.0.insert(record)
    }

    fn update(&self, _record: StoredTrigger) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("updates disabled".to_string()))
    }

    fn remove(&self, id: TriggerId) -> Result<(), StoreError> {
        self.0.remove(id)
    }
}

#[test]
fn insert_is_a_single_write() {
    let memory = MemoryTriggerStore::new();
    let registries = Arc::new(Registries::new());
    register_test_types(&registries);
    let clock = FakeClock::new();
    let loader = TriggerLoader::new(Arc::new(NoUpdates(memory.clone())), registries, clock.shared());

    let mut trigger = flag_trigger("schedule", 5_000);
    let id = loader.insert(&mut trigger).unwrap();
    assert_eq!(trigger.id(), id);
    assert_eq!(memory.len(), 1);

    let loaded = loader.load(id).unwrap().unwrap();
    assert_eq!(loaded.id(), id);
    assert_eq!(loaded.last_modify_time(), clock.epoch_ms());
}
