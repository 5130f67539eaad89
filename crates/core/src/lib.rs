// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! cadence-core: trigger, condition and schedule model for the Cadence scheduler

pub mod action;
pub mod checker;
pub mod clock;
pub mod condition;
pub mod cron;
pub mod cron_calculator;
pub mod execution;
pub mod expr;
pub mod period;
pub mod registry;
pub mod schedule;
pub mod time_checker;
pub mod time_fmt;
pub mod trigger;

pub use action::{ActionError, TriggerAction};
pub use checker::{CheckerError, ConditionChecker};
pub use clock::{Clock, FakeClock, SharedClock, SystemClock};
pub use condition::{Condition, ConditionError};
pub use self::cron::{CronError, CronExpression};
pub use cron_calculator::{CronCalculator, DEFAULT_SCHEDULE_END_EPOCH_MS};
pub use execution::ExecutionOptions;
pub use expr::{Expr, ExprError};
pub use period::{Period, PeriodError, PeriodUnit};
pub use registry::{ActionRegistry, CheckerRegistry, RegistryError, Registries, TypeRegistry};
pub use schedule::{parse_timezone, Recurrence, Schedule, ScheduleError};
pub use time_checker::{BasicTimeChecker, BASIC_TIME_CHECKER_TYPE};
pub use time_fmt::format_epoch_ms;
pub use trigger::{
    CodecError, Trigger, TriggerBuilder, TriggerId, TriggerStatus, END_TIME_CHECKER_PREFIX,
};

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
