// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Time-based condition checker.
//!
//! Evaluates true once its next check time has passed. Recurring checkers
//! step forward by a fixed period or cron expression when reset; one-shot
//! checkers stay in the past so their condition remains met.

use crate::checker::{CheckerError, ConditionChecker};
use crate::clock::SharedClock;
use crate::cron::CronExpression;
use crate::period::Period;
use crate::schedule::Recurrence;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::any::Any;

/// Registry tag of [`BasicTimeChecker`].
pub const BASIC_TIME_CHECKER_TYPE: &str = "BasicTimeChecker";

/// Upper bound on period/cron steps taken to catch up with the clock.
const MAX_ADVANCE_STEPS: u32 = 100_000;

/// At most this many skipped fire times are kept per catch-up.
const MAX_RECORDED_MISSES: usize = 100;

#[derive(Debug, Clone)]
pub struct BasicTimeChecker {
    id: String,
    first_check_time: i64,
    timezone: Tz,
    next_check_time: i64,
    is_recurring: bool,
    skip_past_checks: bool,
    recurrence: Recurrence,
    clock: SharedClock,
    missed: Vec<i64>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TimeCheckerState {
    id: String,
    first_check_time: i64,
    timezone: Tz,
    next_check_time: i64,
    is_recurring: bool,
    skip_past_checks: bool,
    #[serde(default)]
    period: Option<Period>,
    #[serde(default)]
    cron_expression: Option<CronExpression>,
}

impl BasicTimeChecker {
    /// Create a checker first due at `first_check_time`.
    ///
    /// Occurrences of a recurring checker that are already in the past are
    /// stepped over immediately and are not reported as missed.
    pub fn new(
        id: impl Into<String>,
        first_check_time: i64,
        timezone: Tz,
        is_recurring: bool,
        skip_past_checks: bool,
        recurrence: Recurrence,
        clock: SharedClock,
    ) -> Self {
        let mut checker = Self {
            id: id.into(),
            first_check_time,
            timezone,
            next_check_time: first_check_time,
            is_recurring,
            skip_past_checks,
            recurrence,
            clock,
            missed: Vec::new(),
        };
        checker.step_past_now(false);
        checker
    }

    /// One-shot checker that becomes true once `end_time` has passed.
    pub fn end_time(
        id: impl Into<String>,
        first_check_time: i64,
        end_time: i64,
        timezone: Tz,
        clock: SharedClock,
    ) -> Self {
        Self {
            id: id.into(),
            first_check_time,
            timezone,
            next_check_time: end_time,
            is_recurring: false,
            skip_past_checks: false,
            recurrence: Recurrence::Once,
            clock,
            missed: Vec::new(),
        }
    }

    /// Rebuild from serialized state.
    ///
    /// When `skipPastChecks` is set, occurrences that passed while the
    /// checker was not loaded are skipped and recorded as missed.
    pub fn from_json(state: &Value, clock: SharedClock) -> Result<Self, CheckerError> {
        let state: TimeCheckerState = serde_json::from_value(state.clone())?;
        let recurrence = Recurrence::from_parts(state.period, state.cron_expression)
            .map_err(|e| CheckerError::InvalidState(e.to_string()))?;
        let mut checker = Self {
            id: state.id,
            first_check_time: state.first_check_time,
            timezone: state.timezone,
            next_check_time: state.next_check_time,
            is_recurring: state.is_recurring,
            skip_past_checks: state.skip_past_checks,
            recurrence,
            clock,
            missed: Vec::new(),
        };
        if checker.skip_past_checks {
            let skipped = checker.step_past_now(true);
            checker.record_missed(skipped);
        }
        Ok(checker)
    }

    pub fn first_check_time(&self) -> i64 {
        self.first_check_time
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn is_recurring(&self) -> bool {
        self.is_recurring
    }

    pub fn skip_past_checks(&self) -> bool {
        self.skip_past_checks
    }

    pub fn recurrence(&self) -> &Recurrence {
        &self.recurrence
    }

    /// Step the next check time forward until it is after now, returning
    /// the occurrences stepped over.
    ///
    /// The starting value counts as stepped over only when `include_start`
    /// is set.
    fn step_past_now(&mut self, include_start: bool) -> Vec<i64> {
        let now = self.clock.epoch_ms();
        let mut date = self.next_check_time;
        let mut skipped = Vec::new();
        if include_start && date <= now && self.recurrence.is_repeating() {
            skipped.push(date);
        }

        let mut steps = 0;
        while date <= now {
            if steps >= MAX_ADVANCE_STEPS {
                tracing::warn!(
                    checker = %self.id,
                    steps,
                    "time checker did not reach the present, giving up"
                );
                break;
            }
            let Some(next) = self.recurrence.next_after(date, self.timezone) else {
                break;
            };
            date = next;
            steps += 1;
            if date <= now && skipped.len() < MAX_RECORDED_MISSES {
                skipped.push(date);
            }
        }

        self.next_check_time = date;
        skipped
    }

    fn record_missed(&mut self, skipped: Vec<i64>) {
        let room = MAX_RECORDED_MISSES.saturating_sub(self.missed.len());
        self.missed.extend(skipped.into_iter().take(room));
    }
}

impl ConditionChecker for BasicTimeChecker {
    fn id(&self) -> &str {
        &self.id
    }

    fn checker_type(&self) -> &str {
        BASIC_TIME_CHECKER_TYPE
    }

    fn eval(&self) -> Result<Value, CheckerError> {
        Ok(Value::Bool(self.next_check_time < self.clock.epoch_ms()))
    }

    fn next_check_time(&self) -> i64 {
        self.next_check_time
    }

    fn reset(&mut self) {
        let skipped = self.step_past_now(false);
        self.record_missed(skipped);
    }

    fn to_json(&self) -> Result<Value, CheckerError> {
        let (period, cron_expression) = self.recurrence.clone().into_parts();
        let state = TimeCheckerState {
            id: self.id.clone(),
            first_check_time: self.first_check_time,
            timezone: self.timezone,
            next_check_time: self.next_check_time,
            is_recurring: self.is_recurring,
            skip_past_checks: self.skip_past_checks,
            period,
            cron_expression,
        };
        Ok(serde_json::to_value(state)?)
    }

    fn clone_box(&self) -> Box<dyn ConditionChecker> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn take_missed_check_times(&mut self) -> Vec<i64> {
        std::mem::take(&mut self.missed)
    }
}

#[cfg(test)]
#[path = "time_checker_tests.rs"]
mod tests;
