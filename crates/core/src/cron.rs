// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Quartz-style cron expressions evaluated in a schedule's time zone.
//!
//! Accepts 5 (minute-based), 6 (second-prefixed) or 7 (with year) fields.
//! `?` is accepted in the day fields and treated as `*`.

use chrono::TimeZone;
use chrono_tz::Tz;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CronError {
    #[error("cron expression '{expr}' has {count} fields, expected 5, 6 or 7")]
    FieldCount { expr: String, count: usize },
    #[error("invalid cron expression '{expr}': {message}")]
    Invalid { expr: String, message: String },
    #[error("invalid value '{value}' in cron field '{field}'")]
    InvalidField { field: String, value: String },
}

/// A parsed cron expression.
#[derive(Clone)]
pub struct CronExpression {
    raw: String,
    schedule: ::cron::Schedule,
}

impl CronExpression {
    pub fn parse(expr: &str) -> Result<Self, CronError> {
        let normalized = normalize(expr)?;
        let schedule =
            ::cron::Schedule::from_str(&normalized).map_err(|e| CronError::Invalid {
                expr: expr.to_string(),
                message: e.to_string(),
            })?;
        Ok(Self {
            raw: expr.trim().to_string(),
            schedule,
        })
    }

    /// The expression as written by the user.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// First fire time strictly after `epoch_ms`, or `None` if the
    /// expression never fires again.
    pub fn next_after(&self, epoch_ms: i64, tz: Tz) -> Option<i64> {
        let from = tz.timestamp_millis_opt(epoch_ms).single()?;
        self.schedule
            .after(&from)
            .next()
            .map(|next| next.timestamp_millis())
    }
}

/// Rewrite into the 6/7-field form the `cron` crate accepts.
fn normalize(expr: &str) -> Result<String, CronError> {
    let mut fields: Vec<&str> = expr.split_whitespace().collect();
    match fields.len() {
        5 => fields.insert(0, "0"),
        6 | 7 => {}
        count => {
            return Err(CronError::FieldCount {
                expr: expr.to_string(),
                count,
            })
        }
    }
    let fields: Vec<&str> = fields
        .into_iter()
        .map(|f| if f == "?" { "*" } else { f })
        .collect();
    Ok(fields.join(" "))
}

impl fmt::Debug for CronExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CronExpression").field(&self.raw).finish()
    }
}

impl fmt::Display for CronExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl PartialEq for CronExpression {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for CronExpression {}

impl FromStr for CronExpression {
    type Err = CronError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for CronExpression {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for CronExpression {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[path = "cron_tests.rs"]
mod tests;
