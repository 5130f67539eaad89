// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Declarative schedules read from `schedules.toml`.
//!
//! ```toml
//! [[schedule]]
//! project_id = 7
//! project = "etl"
//! flow = "nightly"
//! user = "alice"
//! first_time = "2026-01-01T02:00:00-08:00"
//! timezone = "America/Los_Angeles"
//! period = "1d"
//! ```

use cadence_core::{parse_timezone, ExecutionOptions, Recurrence, Schedule, ScheduleError};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchedulesFileError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("schedule for flow {flow}: {message}")]
    Invalid { flow: String, message: String },
    #[error("schedule for flow {flow}: {source}")]
    Schedule {
        flow: String,
        #[source]
        source: ScheduleError,
    },
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SchedulesFile {
    #[serde(default)]
    schedule: Vec<ScheduleEntry>,
}

/// One `[[schedule]]` table.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScheduleEntry {
    pub project_id: i64,
    pub project: String,
    pub flow: String,
    pub user: String,
    /// RFC 3339 timestamp of the first run.
    pub first_time: String,
    #[serde(default = "default_timezone")]
    pub timezone: String,
    pub period: Option<String>,
    pub cron: Option<String>,
    /// RFC 3339 timestamp after which the schedule pauses.
    pub end_time: Option<String>,
    #[serde(default = "default_true")]
    pub skip_past_occurrences: bool,
    #[serde(default)]
    pub back_execute_once_on_miss: bool,
    #[serde(default)]
    pub failure_emails: Vec<String>,
}

fn default_timezone() -> String {
    "UTC".to_string()
}

fn default_true() -> bool {
    true
}

impl ScheduleEntry {
    pub fn to_schedule(&self) -> Result<Schedule, SchedulesFileError> {
        let schedule_err = |source| SchedulesFileError::Schedule {
            flow: self.flow.clone(),
            source,
        };
        let timezone = parse_timezone(&self.timezone).map_err(schedule_err)?;
        let recurrence = Recurrence::parse(self.period.as_deref(), self.cron.as_deref())
            .map_err(schedule_err)?;

        let mut schedule = Schedule::new(
            self.project_id,
            self.project.clone(),
            self.flow.clone(),
            self.user.clone(),
            self.epoch_ms(&self.first_time)?,
            timezone,
            recurrence,
        );
        if let Some(end) = &self.end_time {
            schedule.end_sched_time = self.epoch_ms(end)?;
        }
        schedule.skip_past_occurrences = self.skip_past_occurrences;
        schedule.back_execute_once_on_miss = self.back_execute_once_on_miss;
        if !self.failure_emails.is_empty() {
            schedule.execution_options = ExecutionOptions {
                failure_emails: self.failure_emails.clone(),
                failure_emails_override: true,
                ..ExecutionOptions::default()
            };
        }
        Ok(schedule)
    }

    fn epoch_ms(&self, raw: &str) -> Result<i64, SchedulesFileError> {
        chrono::DateTime::parse_from_rfc3339(raw.trim())
            .map(|t| t.timestamp_millis())
            .map_err(|e| SchedulesFileError::Invalid {
                flow: self.flow.clone(),
                message: format!("invalid timestamp '{raw}': {e}"),
            })
    }
}

/// Read the entries in `path`. A missing file has no entries.
pub fn load(path: &Path) -> Result<Vec<ScheduleEntry>, SchedulesFileError> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(SchedulesFileError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    let file: SchedulesFile = toml::from_str(&text).map_err(|source| SchedulesFileError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(file.schedule)
}

#[cfg(test)]
#[path = "schedules_file_tests.rs"]
mod tests;
