// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the trigger and schedule managers

use cadence_core::{ConditionError, TriggerId};
use cadence_storage::LoaderError;
use thiserror::Error;

/// Errors from trigger manager mutations and queries
#[derive(Debug, Error)]
pub enum TriggerManagerError {
    #[error(transparent)]
    Loader(#[from] LoaderError),
    #[error(transparent)]
    Condition(#[from] ConditionError),
    #[error("trigger {0} not found")]
    NotFound(TriggerId),
    #[error("trigger has no id; insert it first")]
    Unassigned,
    #[error("trigger manager already started")]
    AlreadyStarted,
}

/// Errors from schedule management
#[derive(Debug, Error)]
pub enum ScheduleManagerError {
    #[error(transparent)]
    TriggerManager(#[from] TriggerManagerError),
    #[error(transparent)]
    Condition(#[from] ConditionError),
    #[error("schedule {0} is non-recurring and its time already passed")]
    InPast(String),
    #[error("schedule {0} not found")]
    NotFound(TriggerId),
    #[error("failed to parse schedule from trigger {id}: {reason}")]
    InvalidTrigger { id: TriggerId, reason: String },
}

/// Errors from the missed-schedule queue
#[derive(Debug, Error)]
pub enum MissedScheduleError {
    #[error("missed-schedule manager is shut down")]
    ShutDown,
}
