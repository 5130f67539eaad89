// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fixed recurrence periods in the compact `<count><unit>` form.
//!
//! Units: `y` years, `M` months, `w` weeks, `d` days, `h` hours,
//! `m` minutes, `s` seconds. The strings `n` and `null` mean "no period".
//! Calendar units are applied to local time in the schedule's zone, so a
//! daily period keeps its wall-clock time across DST transitions.

use chrono::{Duration, LocalResult, Months, NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PeriodError {
    #[error("empty period string")]
    Empty,
    #[error("invalid period unit '{0}'")]
    InvalidUnit(char),
    #[error("invalid period count in '{0}'")]
    InvalidCount(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PeriodUnit {
    Years,
    Months,
    Weeks,
    Days,
    Hours,
    Minutes,
    Seconds,
}

impl PeriodUnit {
    fn suffix(self) -> char {
        match self {
            PeriodUnit::Years => 'y',
            PeriodUnit::Months => 'M',
            PeriodUnit::Weeks => 'w',
            PeriodUnit::Days => 'd',
            PeriodUnit::Hours => 'h',
            PeriodUnit::Minutes => 'm',
            PeriodUnit::Seconds => 's',
        }
    }

    fn from_suffix(c: char) -> Result<Self, PeriodError> {
        Ok(match c {
            'y' => PeriodUnit::Years,
            'M' => PeriodUnit::Months,
            'w' => PeriodUnit::Weeks,
            'd' => PeriodUnit::Days,
            'h' => PeriodUnit::Hours,
            'm' => PeriodUnit::Minutes,
            's' => PeriodUnit::Seconds,
            other => return Err(PeriodError::InvalidUnit(other)),
        })
    }
}

/// A positive recurrence interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Period {
    count: u32,
    unit: PeriodUnit,
}

impl Period {
    pub fn new(count: u32, unit: PeriodUnit) -> Self {
        Self {
            count: count.max(1),
            unit,
        }
    }

    pub fn days(count: u32) -> Self {
        Self::new(count, PeriodUnit::Days)
    }

    pub fn hours(count: u32) -> Self {
        Self::new(count, PeriodUnit::Hours)
    }

    pub fn minutes(count: u32) -> Self {
        Self::new(count, PeriodUnit::Minutes)
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn unit(&self) -> PeriodUnit {
        self.unit
    }

    /// Parse a period string where `n`/`null` mean no period.
    pub fn parse_optional(s: &str) -> Result<Option<Self>, PeriodError> {
        let s = s.trim();
        if s == "null" || s.ends_with('n') {
            return Ok(None);
        }
        s.parse().map(Some)
    }

    /// Add this period to `epoch_ms`, interpreted in `tz`.
    ///
    /// Returns `None` when the result is out of chrono's range.
    pub fn add_to(&self, epoch_ms: i64, tz: Tz) -> Option<i64> {
        let start = tz.timestamp_millis_opt(epoch_ms).single()?;
        let count = i64::from(self.count);
        let shifted = match self.unit {
            PeriodUnit::Hours => start.checked_add_signed(Duration::hours(count))?,
            PeriodUnit::Minutes => start.checked_add_signed(Duration::minutes(count))?,
            PeriodUnit::Seconds => start.checked_add_signed(Duration::seconds(count))?,
            PeriodUnit::Days | PeriodUnit::Weeks => {
                let days = if self.unit == PeriodUnit::Weeks {
                    count * 7
                } else {
                    count
                };
                let local = start.naive_local().checked_add_signed(Duration::days(days))?;
                resolve_local(&tz, local)?
            }
            PeriodUnit::Months | PeriodUnit::Years => {
                let months = if self.unit == PeriodUnit::Years {
                    self.count.checked_mul(12)?
                } else {
                    self.count
                };
                // chrono clamps to the last day of a shorter month
                let local = start
                    .naive_local()
                    .checked_add_months(Months::new(months))?;
                resolve_local(&tz, local)?
            }
        };
        Some(shifted.timestamp_millis())
    }
}

/// Map a local wall-clock time onto the zone, taking the earlier instant of
/// an ambiguous time and skipping forward over a DST gap.
pub(crate) fn resolve_local(tz: &Tz, local: NaiveDateTime) -> Option<chrono::DateTime<Tz>> {
    match tz.from_local_datetime(&local) {
        LocalResult::Single(dt) => Some(dt),
        LocalResult::Ambiguous(earliest, _) => Some(earliest),
        LocalResult::None => tz
            .from_local_datetime(&local.checked_add_signed(Duration::hours(1))?)
            .earliest(),
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.count, self.unit.suffix())
    }
}

impl FromStr for Period {
    type Err = PeriodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let unit_char = s.chars().last().ok_or(PeriodError::Empty)?;
        let unit = PeriodUnit::from_suffix(unit_char)?;
        let digits = &s[..s.len() - unit_char.len_utf8()];
        let count: u32 = digits
            .parse()
            .map_err(|_| PeriodError::InvalidCount(s.to_string()))?;
        if count == 0 {
            return Err(PeriodError::InvalidCount(s.to_string()));
        }
        Ok(Self { count, unit })
    }
}

impl Serialize for Period {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Period {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[path = "period_tests.rs"]
mod tests;
