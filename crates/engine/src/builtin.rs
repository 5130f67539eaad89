// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Registration of the checker and action types the engine ships with.

use crate::execute_flow::{ExecuteFlowAction, EXECUTE_FLOW_ACTION_TYPE};
use cadence_adapters::FlowExecutor;
use cadence_core::{
    BasicTimeChecker, ConditionChecker, Registries, SharedClock, TriggerAction,
    BASIC_TIME_CHECKER_TYPE,
};
use serde_json::Value;
use std::sync::Arc;

/// Register [`BasicTimeChecker`] and [`ExecuteFlowAction`].
///
/// Decoded checkers read time from `clock`; decoded actions start flows
/// through `executor`.
pub fn register_builtin_types(
    registries: &Registries,
    clock: SharedClock,
    executor: Arc<dyn FlowExecutor>,
) {
    registries
        .checkers
        .register(BASIC_TIME_CHECKER_TYPE, move |state: &Value| {
            let checker = BasicTimeChecker::from_json(state, Arc::clone(&clock))?;
            Ok(Box::new(checker) as Box<dyn ConditionChecker>)
        });
    registries
        .actions
        .register(EXECUTE_FLOW_ACTION_TYPE, move |state: &Value| {
            let action = ExecuteFlowAction::from_json(state, Arc::clone(&executor))?;
            Ok(Arc::new(action) as Arc<dyn TriggerAction>)
        });
}

#[cfg(test)]
#[path = "builtin_tests.rs"]
mod tests;
