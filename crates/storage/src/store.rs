// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Blob-level trigger persistence.
//!
//! A store knows nothing about trigger semantics: it keeps one record per
//! id holding the owning source, the last modify time and the encoded
//! trigger document. [`TriggerLoader`](crate::TriggerLoader) turns records
//! into live triggers.

use crate::{EncodingType, LoaderError};
use cadence_core::{Registries, Trigger, TriggerId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no rows affected: {op} of trigger {id}")]
    NoRowsAffected { op: &'static str, id: TriggerId },
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("corrupt record {id}: {message}")]
    Corrupt { id: String, message: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("compression error: {0}")]
    Compression(String),
}

/// One persisted trigger.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredTrigger {
    pub id: TriggerId,
    pub source: String,
    pub modify_time: i64,
    pub encoding: EncodingType,
    pub payload: Vec<u8>,
}

impl StoredTrigger {
    /// Encode `trigger` into a record keyed by its current id.
    pub fn encode(trigger: &Trigger, encoding: EncodingType) -> Result<Self, LoaderError> {
        let json = serde_json::to_vec(&trigger.to_json()?).map_err(StoreError::Json)?;
        let payload = encoding.encode(&json)?;
        Ok(Self {
            id: trigger.id(),
            source: trigger.source().to_string(),
            modify_time: trigger.last_modify_time(),
            encoding,
            payload,
        })
    }

    /// Decode the payload into a live trigger. The record's id and modify
    /// time win over whatever the document carries.
    pub fn decode(&self, registries: &Registries) -> Result<Trigger, LoaderError> {
        let json = self.encoding.decode(&self.payload)?;
        let value: serde_json::Value = serde_json::from_slice(&json).map_err(StoreError::Json)?;
        let mut trigger = Trigger::from_json(&value, registries)?;
        trigger.set_id(self.id);
        trigger.set_last_modify_time(self.modify_time);
        Ok(trigger)
    }
}

/// Persistence capability behind the trigger manager.
///
/// Calls are synchronous; a slow store stalls the caller.
pub trait TriggerStore: Send + Sync + 'static {
    fn load_all(&self) -> Result<Vec<StoredTrigger>, StoreError>;

    /// Records with `modify_time >= since`.
    fn load_since(&self, since: i64) -> Result<Vec<StoredTrigger>, StoreError>;

    fn load(&self, id: TriggerId) -> Result<Option<StoredTrigger>, StoreError>;

    /// Persist a new record, ignoring `record.id`, and return the assigned id.
    fn insert(&self, record: StoredTrigger) -> Result<TriggerId, StoreError>;

    /// Replace an existing record; [`StoreError::NoRowsAffected`] if absent.
    fn update(&self, record: StoredTrigger) -> Result<(), StoreError>;

    /// Delete a record; [`StoreError::NoRowsAffected`] if absent.
    fn remove(&self, id: TriggerId) -> Result<(), StoreError>;
}
