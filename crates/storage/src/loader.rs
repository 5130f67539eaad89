// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Trigger-level persistence on top of a [`TriggerStore`].

use crate::{EncodingType, StoreError, StoredTrigger, TriggerStore};
use cadence_core::{CodecError, Registries, SharedClock, Trigger, TriggerId};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error};

#[derive(Debug, Error)]
pub enum LoaderError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("failed to decode trigger: {0}")]
    Codec(#[from] CodecError),
}

/// Encodes triggers into records and rebuilds them through the registries.
#[derive(Clone)]
pub struct TriggerLoader {
    store: Arc<dyn TriggerStore>,
    registries: Arc<Registries>,
    clock: SharedClock,
    encoding: EncodingType,
}

impl TriggerLoader {
    pub fn new(store: Arc<dyn TriggerStore>, registries: Arc<Registries>, clock: SharedClock) -> Self {
        Self {
            store,
            registries,
            clock,
            encoding: EncodingType::default(),
        }
    }

    pub fn with_encoding(mut self, encoding: EncodingType) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn registries(&self) -> &Arc<Registries> {
        &self.registries
    }

    /// Every stored trigger that decodes; the rest are logged and skipped.
    pub fn load_all(&self) -> Result<Vec<Trigger>, LoaderError> {
        let records = self.store.load_all()?;
        Ok(self.decode_each(records))
    }

    /// Triggers modified at or after `since`, skipping undecodable ones.
    pub fn load_since(&self, since: i64) -> Result<Vec<Trigger>, LoaderError> {
        let records = self.store.load_since(since)?;
        Ok(self.decode_each(records))
    }

    pub fn load(&self, id: TriggerId) -> Result<Option<Trigger>, LoaderError> {
        match self.store.load(id)? {
            Some(record) => Ok(Some(record.decode(&self.registries)?)),
            None => Ok(None),
        }
    }

    /// Persist a new trigger, stamping its modify time and assigned id.
    ///
    /// One write. The payload keeps the unassigned id; decoding takes the
    /// id from the record key.
    pub fn insert(&self, trigger: &mut Trigger) -> Result<TriggerId, LoaderError> {
        let mut stamped = trigger.clone();
        stamped.set_last_modify_time(self.clock.epoch_ms());
        let id = self
            .store
            .insert(StoredTrigger::encode(&stamped, self.encoding)?)?;
        stamped.set_id(id);
        *trigger = stamped;
        debug!(trigger_id = %id, source = trigger.source(), "inserted trigger");
        Ok(id)
    }

    /// Persist changes to an existing trigger, stamping its modify time.
    pub fn update(&self, trigger: &mut Trigger) -> Result<(), LoaderError> {
        let mut stamped = trigger.clone();
        stamped.set_last_modify_time(self.clock.epoch_ms());
        self.store
            .update(StoredTrigger::encode(&stamped, self.encoding)?)?;
        *trigger = stamped;
        Ok(())
    }

    pub fn remove(&self, id: TriggerId) -> Result<(), LoaderError> {
        self.store.remove(id)?;
        Ok(())
    }

    fn decode_each(&self, records: Vec<StoredTrigger>) -> Vec<Trigger> {
        records
            .into_iter()
            .filter_map(|record| match record.decode(&self.registries) {
                Ok(trigger) => Some(trigger),
                Err(e) => {
                    error!(
                        trigger_id = %record.id,
                        source = %record.source,
                        error = %e,
                        "failed to load trigger, skipping",
                    );
                    None
                }
            })
            .collect()
    }
}

impl std::fmt::Debug for TriggerLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TriggerLoader")
            .field("encoding", &self.encoding)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "loader_tests.rs"]
mod tests;
