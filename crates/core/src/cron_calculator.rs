// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Static analysis of cron expressions.
//!
//! Answers two questions the schedule layer needs without stepping through
//! fire times: can this expression only ever match a single instant, and
//! what is the last instant it can match.

use crate::cron::CronError;
use chrono::{Datelike, NaiveDate, TimeZone};
use chrono_tz::Tz;

/// 2050-01-01T00:00:00Z, used as the end of "effectively unbounded" schedules.
pub const DEFAULT_SCHEDULE_END_EPOCH_MS: i64 = 2_524_608_000_000;

const MONTH_NAMES: [&str; 12] = [
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Second,
    Minute,
    Hour,
    DayOfMonth,
    Month,
    DayOfWeek,
    Year,
}

impl Field {
    fn name(self) -> &'static str {
        match self {
            Field::Second => "second",
            Field::Minute => "minute",
            Field::Hour => "hour",
            Field::DayOfMonth => "day-of-month",
            Field::Month => "month",
            Field::DayOfWeek => "day-of-week",
            Field::Year => "year",
        }
    }

    fn domain(self) -> (u32, u32) {
        match self {
            Field::Second | Field::Minute => (0, 59),
            Field::Hour => (0, 23),
            Field::DayOfMonth => (1, 31),
            Field::Month => (1, 12),
            Field::DayOfWeek => (1, 7),
            Field::Year => (1970, 2099),
        }
    }
}

/// Positional view over the fields of a 5, 6 or 7 field cron expression.
#[derive(Debug, Clone)]
pub struct CronCalculator {
    fields: Vec<String>,
}

impl CronCalculator {
    pub fn new(expr: &str) -> Result<Self, CronError> {
        let fields: Vec<String> = expr.split_whitespace().map(str::to_string).collect();
        if !(5..=7).contains(&fields.len()) {
            return Err(CronError::FieldCount {
                expr: expr.to_string(),
                count: fields.len(),
            });
        }
        Ok(Self { fields })
    }

    fn field(&self, field: Field) -> Option<&str> {
        let index = match (self.fields.len(), field) {
            (5, Field::Second) => return None,
            (5, Field::Year) | (6, Field::Year) => return None,
            (5, f) => f as usize - 1,
            (_, f) => f as usize,
        };
        self.fields.get(index).map(String::as_str)
    }

    /// True when the expression can match exactly one absolute instant.
    ///
    /// Requires a literal year, literal time and month fields, and at least
    /// one day field that is not a wildcard.
    pub fn is_static(&self) -> bool {
        let Some(year) = self.field(Field::Year) else {
            return false;
        };
        let literal_second = self.field(Field::Second).map_or(true, is_literal);
        let literals = literal_second
            && [
                year,
                self.field(Field::Minute).unwrap_or("*"),
                self.field(Field::Hour).unwrap_or("*"),
                self.field(Field::Month).unwrap_or("*"),
            ]
            .into_iter()
            .all(is_literal);
        let day_pinned = [Field::DayOfMonth, Field::DayOfWeek]
            .into_iter()
            .filter_map(|f| self.field(f))
            .any(|v| !is_wildcard(v));
        literals && day_pinned
    }

    /// True when there is no year field or the year field is a wildcard.
    pub fn is_unbounded(&self) -> bool {
        self.field(Field::Year).map_or(true, is_wildcard)
    }

    /// Last instant (epoch ms) the expression can match, evaluated in `tz`.
    ///
    /// Unbounded expressions return [`DEFAULT_SCHEDULE_END_EPOCH_MS`].
    pub fn upper_bound(&self, tz: Tz) -> Result<i64, CronError> {
        if self.is_unbounded() {
            return Ok(DEFAULT_SCHEDULE_END_EPOCH_MS);
        }
        let year = self.field_max(Field::Year)?;
        let month = self.field_max(Field::Month)?;
        let day = self.field_max(Field::DayOfMonth)?;
        let hour = self.field_max(Field::Hour)?;
        let minute = self.field_max(Field::Minute)?;
        let second = match self.field(Field::Second) {
            Some(_) => self.field_max(Field::Second)?,
            None => 0,
        };

        let invalid = || CronError::InvalidField {
            field: "year".to_string(),
            value: year.to_string(),
        };
        let year = i32::try_from(year).map_err(|_| invalid())?;
        let day = day.min(days_in_month(year, month).ok_or_else(invalid)?);
        let local = NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|d| d.and_hms_opt(hour, minute, second))
            .ok_or_else(invalid)?;
        let instant = tz
            .from_local_datetime(&local)
            .latest()
            .or_else(|| crate::period::resolve_local(&tz, local))
            .ok_or_else(invalid)?;
        Ok(instant.timestamp_millis())
    }

    fn field_max(&self, field: Field) -> Result<u32, CronError> {
        let value = self.field(field).unwrap_or("*");
        let (lo, hi) = field.domain();
        let mut max = None;
        for part in value.split(',') {
            let (base, step) = match part.split_once('/') {
                Some((base, step)) => {
                    let step = step.parse::<u32>().map_err(|_| CronError::InvalidField {
                        field: field.name().to_string(),
                        value: part.to_string(),
                    })?;
                    (base, Some(step))
                }
                None => (part, None),
            };
            let (start, end) = if is_wildcard(base) || base.is_empty() {
                (lo, hi)
            } else if base.starts_with('L') {
                (hi, hi)
            } else if let Some((a, b)) = base.split_once('-') {
                (parse_value(field, a)?, parse_value(field, b)?)
            } else {
                let v = parse_value(field, base)?;
                (v, if step.is_some() { hi } else { v })
            };
            let top = match step {
                // wrap-around range such as 22-2
                _ if end < start => hi,
                Some(step) if step > 0 => start + (end - start) / step * step,
                _ => end,
            };
            max = max.max(Some(top));
        }
        max.ok_or_else(|| CronError::InvalidField {
            field: field.name().to_string(),
            value: value.to_string(),
        })
    }
}

fn is_wildcard(value: &str) -> bool {
    value == "*" || value == "?"
}

fn is_literal(value: &str) -> bool {
    (!value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()))
        || MONTH_NAMES.contains(&value.to_ascii_uppercase().as_str())
}

fn parse_value(field: Field, token: &str) -> Result<u32, CronError> {
    let invalid = || CronError::InvalidField {
        field: field.name().to_string(),
        value: token.to_string(),
    };
    let token = token.trim_end_matches(['W', 'L']);
    let value = match token.parse::<u32>() {
        Ok(v) => v,
        Err(_) if field == Field::Month => MONTH_NAMES
            .iter()
            .position(|m| m.eq_ignore_ascii_case(token))
            .map(|i| i as u32 + 1)
            .ok_or_else(invalid)?,
        Err(_) => return Err(invalid()),
    };
    let (lo, hi) = field.domain();
    if value < lo || value > hi {
        return Err(invalid());
    }
    Ok(value)
}

fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)?
        .pred_opt()
        .map(|d| d.day())
}

#[cfg(test)]
#[path = "cron_calculator_tests.rs"]
mod tests;
