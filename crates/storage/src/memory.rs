// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory trigger store for tests and ephemeral engines.

use crate::{StoreError, StoredTrigger, TriggerStore};
use cadence_core::TriggerId;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Default)]
struct MemoryState {
    records: BTreeMap<TriggerId, StoredTrigger>,
    last_id: i64,
    unavailable: bool,
}

/// Clones share the same records.
#[derive(Debug, Clone, Default)]
pub struct MemoryTriggerStore {
    inner: Arc<Mutex<MemoryState>>,
}

impl MemoryTriggerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call fail with [`StoreError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.inner.lock().unavailable = unavailable;
    }

    pub fn len(&self) -> usize {
        self.inner.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: TriggerId) -> bool {
        self.inner.lock().records.contains_key(&id)
    }

    /// Store a record verbatim, bypassing id allocation.
    pub fn put_raw(&self, record: StoredTrigger) {
        let mut state = self.inner.lock();
        state.last_id = state.last_id.max(record.id.0);
        state.records.insert(record.id, record);
    }

    fn with_state<T>(
        &self,
        f: impl FnOnce(&mut MemoryState) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut state = self.inner.lock();
        if state.unavailable {
            return Err(StoreError::Unavailable("memory store offline".to_string()));
        }
        f(&mut state)
    }
}

impl TriggerStore for MemoryTriggerStore {
    fn load_all(&self) -> Result<Vec<StoredTrigger>, StoreError> {
        self.with_state(|s| Ok(s.records.values().cloned().collect()))
    }

    fn load_since(&self, since: i64) -> Result<Vec<StoredTrigger>, StoreError> {
        self.with_state(|s| {
            Ok(s.records
                .values()
                .filter(|r| r.modify_time >= since)
                .cloned()
                .collect())
        })
    }

    fn load(&self, id: TriggerId) -> Result<Option<StoredTrigger>, StoreError> {
        self.with_state(|s| Ok(s.records.get(&id).cloned()))
    }

    fn insert(&self, mut record: StoredTrigger) -> Result<TriggerId, StoreError> {
        self.with_state(|s| {
            s.last_id += 1;
            let id = TriggerId(s.last_id);
            record.id = id;
            s.records.insert(id, record);
            Ok(id)
        })
    }

    fn update(&self, record: StoredTrigger) -> Result<(), StoreError> {
        self.with_state(|s| match s.records.get_mut(&record.id) {
            Some(slot) => {
                *slot = record;
                Ok(())
            }
            None => Err(StoreError::NoRowsAffected {
                op: "update",
                id: record.id,
            }),
        })
    }

    fn remove(&self, id: TriggerId) -> Result<(), StoreError> {
        self.with_state(|s| match s.records.remove(&id) {
            Some(_) => Ok(()),
            None => Err(StoreError::NoRowsAffected { op: "remove", id }),
        })
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
