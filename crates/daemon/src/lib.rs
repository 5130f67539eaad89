// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cadence daemon library
//!
//! Startup and shutdown wiring shared by the `cadenced` binary and the
//! workspace integration tests.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod env;
pub mod lifecycle;
pub mod logging;
pub mod schedules_file;

pub use lifecycle::{
    apply_schedule_entries, flow_executor, startup, startup_with, Adapters, Config, Daemon,
    DaemonNotifier, LifecycleError,
};
pub use schedules_file::{ScheduleEntry, SchedulesFileError};
