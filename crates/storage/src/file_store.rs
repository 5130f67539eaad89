// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Filesystem trigger store.
//!
//! Each trigger lives in `<id>.trigger`: a one-line JSON header followed by
//! the encoded payload. Writes go to a `.tmp` sibling, are synced, then
//! renamed over the record so a crash never leaves a torn file. Records that
//! cannot be read are moved to `.bak` and skipped.

use crate::{EncodingType, StoreError, StoredTrigger, TriggerStore};
use cadence_core::TriggerId;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::warn;

const RECORD_EXTENSION: &str = "trigger";

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecordHeader {
    id: TriggerId,
    source: String,
    modify_time: i64,
    encoding: EncodingType,
}

#[derive(Debug)]
pub struct FsTriggerStore {
    dir: PathBuf,
    /// Highest id handed out; also serializes writers.
    last_id: Mutex<i64>,
}

impl FsTriggerStore {
    /// Open (creating if needed) a store rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        let mut last_id = 0;
        for entry in fs::read_dir(&dir)? {
            let name = entry?.file_name();
            // Backups count too so a quarantined id is never reused.
            if let Some(id) = leading_id(&name.to_string_lossy()) {
                last_id = last_id.max(id);
            }
        }
        Ok(Self {
            dir,
            last_id: Mutex::new(last_id),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, id: TriggerId) -> PathBuf {
        self.dir.join(format!("{}.{RECORD_EXTENSION}", id.0))
    }

    fn record_paths(&self) -> Result<Vec<PathBuf>, StoreError> {
        let mut paths = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|e| e == RECORD_EXTENSION) {
                paths.push(path);
            }
        }
        paths.sort_by_key(|p| p.file_name().and_then(|n| leading_id(&n.to_string_lossy())));
        Ok(paths)
    }

    /// Read every record, quarantining the unreadable ones.
    fn scan(&self) -> Result<Vec<StoredTrigger>, StoreError> {
        let mut records = Vec::new();
        for path in self.record_paths()? {
            match read_record(&path) {
                Ok(record) => records.push(record),
                Err(e) => {
                    let bak_path = rotate_bak_path(&path);
                    warn!(
                        error = %e,
                        path = %path.display(),
                        bak = %bak_path.display(),
                        "Corrupt trigger record, moving to .bak",
                    );
                    fs::rename(&path, &bak_path)?;
                }
            }
        }
        Ok(records)
    }
}

impl TriggerStore for FsTriggerStore {
    fn load_all(&self) -> Result<Vec<StoredTrigger>, StoreError> {
        self.scan()
    }

    fn load_since(&self, since: i64) -> Result<Vec<StoredTrigger>, StoreError> {
        let mut records = self.scan()?;
        records.retain(|r| r.modify_time >= since);
        Ok(records)
    }

    fn load(&self, id: TriggerId) -> Result<Option<StoredTrigger>, StoreError> {
        let path = self.record_path(id);
        if !path.exists() {
            return Ok(None);
        }
        read_record(&path).map(Some)
    }

    fn insert(&self, mut record: StoredTrigger) -> Result<TriggerId, StoreError> {
        let mut last_id = self.last_id.lock();
        let id = TriggerId(*last_id + 1);
        record.id = id;
        write_record(&self.record_path(id), &record)?;
        *last_id = id.0;
        Ok(id)
    }

    fn update(&self, record: StoredTrigger) -> Result<(), StoreError> {
        let _guard = self.last_id.lock();
        let path = self.record_path(record.id);
        if !path.exists() {
            return Err(StoreError::NoRowsAffected {
                op: "update",
                id: record.id,
            });
        }
        write_record(&path, &record)
    }

    fn remove(&self, id: TriggerId) -> Result<(), StoreError> {
        let _guard = self.last_id.lock();
        let path = self.record_path(id);
        if !path.exists() {
            return Err(StoreError::NoRowsAffected { op: "remove", id });
        }
        fs::remove_file(path)?;
        Ok(())
    }
}

/// `"12.trigger"`, `"12.bak.2"` -> 12
fn leading_id(name: &str) -> Option<i64> {
    name.split('.').next()?.parse().ok()
}

fn read_record(path: &Path) -> Result<StoredTrigger, StoreError> {
    let bytes = fs::read(path)?;
    let corrupt = |message: String| StoreError::Corrupt {
        id: path.display().to_string(),
        message,
    };
    let split = bytes
        .iter()
        .position(|b| *b == b'\n')
        .ok_or_else(|| corrupt("missing header line".to_string()))?;
    let header: RecordHeader =
        serde_json::from_slice(&bytes[..split]).map_err(|e| corrupt(e.to_string()))?;
    Ok(StoredTrigger {
        id: header.id,
        source: header.source,
        modify_time: header.modify_time,
        encoding: header.encoding,
        payload: bytes[split + 1..].to_vec(),
    })
}

/// Write a record atomically (write to .tmp, then rename).
fn write_record(path: &Path, record: &StoredTrigger) -> Result<(), StoreError> {
    let header = RecordHeader {
        id: record.id,
        source: record.source.clone(),
        modify_time: record.modify_time,
        encoding: record.encoding,
    };
    let tmp_path = path.with_extension("tmp");
    {
        let file = File::create(&tmp_path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, &header)?;
        writer.write_all(b"\n")?;
        writer.write_all(&record.payload)?;
        let file = writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
    }
    fs::rename(&tmp_path, path)?;
    Ok(())
}

const MAX_BAK_FILES: u32 = 3;

/// Pick the next `.bak` / `.bak.N` path, rotating older backups out.
///
/// Keeps up to [`MAX_BAK_FILES`] backups: `.bak`, `.bak.2`, `.bak.3`.
pub(crate) fn rotate_bak_path(path: &Path) -> PathBuf {
    let bak = |n: u32| {
        if n == 1 {
            path.with_extension("bak")
        } else {
            path.with_extension(format!("bak.{n}"))
        }
    };

    let oldest = bak(MAX_BAK_FILES);
    if oldest.exists() {
        let _ = fs::remove_file(&oldest);
    }

    for n in (1..MAX_BAK_FILES).rev() {
        let src = bak(n);
        if src.exists() {
            let _ = fs::rename(&src, bak(n + 1));
        }
    }

    bak(1)
}

#[cfg(test)]
#[path = "file_store_tests.rs"]
mod tests;
