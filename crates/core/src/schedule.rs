// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! User-facing flow schedules.

use crate::cron::{CronError, CronExpression};
use crate::cron_calculator::{CronCalculator, DEFAULT_SCHEDULE_END_EPOCH_MS};
use crate::execution::ExecutionOptions;
use crate::period::{Period, PeriodError};
use crate::time_fmt::format_epoch_ms;
use crate::trigger::{TriggerId, TriggerStatus};
use chrono_tz::Tz;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("a schedule cannot have both a period ({period}) and a cron expression ({cron})")]
    ConflictingRecurrence { period: String, cron: String },
    #[error(transparent)]
    Cron(#[from] CronError),
    #[error(transparent)]
    Period(#[from] PeriodError),
    #[error("unknown time zone '{0}'")]
    UnknownTimeZone(String),
}

/// Look up an IANA zone name such as `America/Los_Angeles`.
pub fn parse_timezone(name: &str) -> Result<Tz, ScheduleError> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| ScheduleError::UnknownTimeZone(name.to_string()))
}

/// How a schedule repeats. A period and a cron expression are mutually
/// exclusive; neither means a one-shot schedule.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Recurrence {
    #[default]
    Once,
    Period(Period),
    Cron(CronExpression),
}

impl Recurrence {
    pub fn from_parts(
        period: Option<Period>,
        cron: Option<CronExpression>,
    ) -> Result<Self, ScheduleError> {
        match (period, cron) {
            (None, None) => Ok(Recurrence::Once),
            (Some(p), None) => Ok(Recurrence::Period(p)),
            (None, Some(c)) => Ok(Recurrence::Cron(c)),
            (Some(p), Some(c)) => Err(ScheduleError::ConflictingRecurrence {
                period: p.to_string(),
                cron: c.to_string(),
            }),
        }
    }

    /// Parse the textual forms used by config files and APIs.
    pub fn parse(period: Option<&str>, cron: Option<&str>) -> Result<Self, ScheduleError> {
        let period = match period {
            Some(p) => Period::parse_optional(p)?,
            None => None,
        };
        let cron = cron.map(CronExpression::parse).transpose()?;
        Self::from_parts(period, cron)
    }

    pub fn into_parts(self) -> (Option<Period>, Option<CronExpression>) {
        match self {
            Recurrence::Once => (None, None),
            Recurrence::Period(p) => (Some(p), None),
            Recurrence::Cron(c) => (None, Some(c)),
        }
    }

    pub fn period(&self) -> Option<&Period> {
        match self {
            Recurrence::Period(p) => Some(p),
            _ => None,
        }
    }

    pub fn cron(&self) -> Option<&CronExpression> {
        match self {
            Recurrence::Cron(c) => Some(c),
            _ => None,
        }
    }

    /// True when there is a rule to step to a following occurrence.
    pub fn is_repeating(&self) -> bool {
        !matches!(self, Recurrence::Once)
    }

    /// Occurrence following `epoch_ms`, or `None` for one-shot and
    /// exhausted cron recurrences.
    pub fn next_after(&self, epoch_ms: i64, tz: Tz) -> Option<i64> {
        match self {
            Recurrence::Once => None,
            Recurrence::Period(p) => p.add_to(epoch_ms, tz),
            Recurrence::Cron(c) => c.next_after(epoch_ms, tz),
        }
    }
}

/// A flow scheduled to run once or repeatedly.
///
/// Backed by a trigger; `schedule_id` is the trigger's id.
#[derive(Debug, Clone, PartialEq)]
pub struct Schedule {
    pub schedule_id: TriggerId,
    pub project_id: i64,
    pub project_name: String,
    pub flow_id: String,
    pub first_sched_time: i64,
    pub end_sched_time: i64,
    pub timezone: Tz,
    pub recurrence: Recurrence,
    pub submit_user: String,
    pub submit_time: i64,
    pub last_modify_time: i64,
    pub status: TriggerStatus,
    pub next_exec_time: i64,
    pub execution_options: ExecutionOptions,
    pub skip_past_occurrences: bool,
    pub back_execute_once_on_miss: bool,
}

impl Schedule {
    /// New, not yet persisted schedule ending at the default end time.
    pub fn new(
        project_id: i64,
        project_name: impl Into<String>,
        flow_id: impl Into<String>,
        submit_user: impl Into<String>,
        first_sched_time: i64,
        timezone: Tz,
        recurrence: Recurrence,
    ) -> Self {
        Self {
            schedule_id: TriggerId::UNASSIGNED,
            project_id,
            project_name: project_name.into(),
            flow_id: flow_id.into(),
            first_sched_time,
            end_sched_time: DEFAULT_SCHEDULE_END_EPOCH_MS,
            timezone,
            recurrence,
            submit_user: submit_user.into(),
            submit_time: first_sched_time,
            last_modify_time: first_sched_time,
            status: TriggerStatus::Ready,
            next_exec_time: first_sched_time,
            execution_options: ExecutionOptions::default(),
            skip_past_occurrences: true,
            back_execute_once_on_miss: false,
        }
    }

    /// A period schedule recurs; a cron schedule recurs unless it can only
    /// match a single instant.
    pub fn is_recurring(&self) -> bool {
        match &self.recurrence {
            Recurrence::Once => false,
            Recurrence::Period(_) => true,
            Recurrence::Cron(c) => !CronCalculator::new(c.as_str())
                .map(|calc| calc.is_static())
                .unwrap_or(false),
        }
    }

    /// Move `next_exec_time` to the first occurrence after `now`.
    ///
    /// Returns false when the schedule has no occurrence after `now`.
    pub fn update_time(&mut self, now: i64) -> bool {
        if self.next_exec_time > now {
            return true;
        }
        let mut next = self.next_exec_time;
        while next <= now {
            match self.recurrence.next_after(next, self.timezone) {
                Some(n) => next = n,
                None => return false,
            }
        }
        self.next_exec_time = next;
        true
    }

    /// True when both describe the same flow, timing and options,
    /// ignoring ids, submission stamps, status and the next fire time.
    pub fn same_definition(&self, other: &Schedule) -> bool {
        self.project_id == other.project_id
            && self.project_name == other.project_name
            && self.flow_id == other.flow_id
            && self.submit_user == other.submit_user
            && self.first_sched_time == other.first_sched_time
            && self.end_sched_time == other.end_sched_time
            && self.timezone == other.timezone
            && self.recurrence == other.recurrence
            && self.execution_options == other.execution_options
            && self.skip_past_occurrences == other.skip_past_occurrences
            && self.back_execute_once_on_miss == other.back_execute_once_on_miss
    }

    pub fn description(&self) -> String {
        let base = format!(
            "{}.{} (project {}) scheduled at {} in {}",
            self.project_name,
            self.flow_id,
            self.project_id,
            format_epoch_ms(self.first_sched_time),
            self.timezone
        );
        match &self.recurrence {
            Recurrence::Once => base,
            Recurrence::Period(p) => format!("{base} with recurring period of {p}"),
            Recurrence::Cron(c) => format!("{base} with cron expression {{{c}}}"),
        }
    }
}

#[cfg(test)]
#[path = "schedule_tests.rs"]
mod tests;
