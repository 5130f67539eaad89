// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Cadence engine: trigger scanner, schedules and missed-schedule recovery

mod builtin;
pub mod config;
pub mod env;
mod error;
mod execute_flow;
mod missed_schedules;
mod scan;
mod schedule_loader;
mod schedule_manager;
mod trigger_manager;
mod trigger_set;

#[cfg(test)]
mod test_helpers;

pub use builtin::register_builtin_types;
pub use config::{
    ConfigError, EngineConfig, ExecutorConfig, MissedScheduleConfig, ScannerConfig,
    SIMPLE_TIME_TRIGGER_SOURCE,
};
pub use env::EnvOverrides;
pub use error::{MissedScheduleError, ScheduleManagerError, TriggerManagerError};
pub use execute_flow::{ExecuteFlowAction, EXECUTE_FLOW_ACTION_ID, EXECUTE_FLOW_ACTION_TYPE};
pub use missed_schedules::{
    MissedScheduleStats, MissedScheduleTask, MissedSchedulesManager, MISSED_SCHEDULE_SUBJECT,
};
pub use scan::ScanReport;
pub use schedule_loader::{
    trigger_to_schedule, ScheduleUpdate, TriggerBasedScheduleLoader, BASIC_TIME_CHECKER_ID,
    END_TIME_CHECKER_ID,
};
pub use schedule_manager::ScheduleManager;
pub use trigger_manager::{MissedScheduleSink, ScannerStats, TriggerManager};
pub use trigger_set::TriggerSet;
