// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.
#![cfg_attr(coverage_nightly, coverage(off))]

use crate::action::{ActionError, TriggerAction};
use crate::checker::{CheckerError, ConditionChecker};
use crate::registry::Registries;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::any::Any;
use std::sync::Arc;

pub const FLAG_CHECKER_TYPE: &str = "FlagChecker";
pub const RECORDING_ACTION_TYPE: &str = "RecordingAction";

// ── Checkers ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FlagState {
    value: Value,
    next_check_time: i64,
    #[serde(default)]
    fail: bool,
    #[serde(default)]
    resets: u32,
    #[serde(default)]
    stopped: bool,
    #[serde(default)]
    missed: Vec<i64>,
}

/// Checker whose output is set directly by the test.
///
/// Clones share state, so a test can keep a handle after moving the checker
/// into a condition.
#[derive(Debug, Clone)]
pub struct FlagChecker {
    id: String,
    state: Arc<Mutex<FlagState>>,
}

impl FlagChecker {
    pub fn new(id: &str, value: bool, next_check_time: i64) -> Self {
        Self {
            id: id.to_string(),
            state: Arc::new(Mutex::new(FlagState {
                value: Value::Bool(value),
                next_check_time,
                fail: false,
                resets: 0,
                stopped: false,
                missed: Vec::new(),
            })),
        }
    }

    pub fn boxed(&self) -> Box<dyn ConditionChecker> {
        Box::new(self.clone())
    }

    pub fn set_value(&self, value: impl Into<Value>) {
        self.state.lock().value = value.into();
    }

    pub fn set_next_check_time(&self, next: i64) {
        self.state.lock().next_check_time = next;
    }

    /// Make `eval` return an error.
    pub fn set_failing(&self, fail: bool) {
        self.state.lock().fail = fail;
    }

    pub fn push_missed(&self, at: i64) {
        self.state.lock().missed.push(at);
    }

    pub fn resets(&self) -> u32 {
        self.state.lock().resets
    }

    pub fn is_stopped(&self) -> bool {
        self.state.lock().stopped
    }

    fn from_json(state: &Value) -> Result<Self, CheckerError> {
        let id = state
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| CheckerError::InvalidState("missing id".to_string()))?
            .to_string();
        let flag: FlagState = serde_json::from_value(state.clone())?;
        Ok(Self {
            id,
            state: Arc::new(Mutex::new(flag)),
        })
    }
}

impl ConditionChecker for FlagChecker {
    fn id(&self) -> &str {
        &self.id
    }

    fn checker_type(&self) -> &str {
        FLAG_CHECKER_TYPE
    }

    fn eval(&self) -> Result<Value, CheckerError> {
        let state = self.state.lock();
        if state.fail {
            return Err(CheckerError::Failed {
                id: self.id.clone(),
                message: "injected failure".to_string(),
            });
        }
        Ok(state.value.clone())
    }

    fn next_check_time(&self) -> i64 {
        self.state.lock().next_check_time
    }

    /// Resetting clears the flag and pushes the next check an hour out.
    fn reset(&mut self) {
        let mut state = self.state.lock();
        state.resets += 1;
        state.value = Value::Bool(false);
        state.next_check_time += 3_600_000;
    }

    fn stop(&mut self) {
        self.state.lock().stopped = true;
    }

    fn to_json(&self) -> Result<Value, CheckerError> {
        let mut value = serde_json::to_value(&*self.state.lock())?;
        if let Value::Object(map) = &mut value {
            map.insert("id".to_string(), Value::String(self.id.clone()));
        }
        Ok(value)
    }

    fn clone_box(&self) -> Box<dyn ConditionChecker> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn take_missed_check_times(&mut self) -> Vec<i64> {
        std::mem::take(&mut self.state.lock().missed)
    }
}

// ── Actions ─────────────────────────────────────────────────────────────────

/// Action that counts invocations and can be told to fail.
#[derive(Debug, Clone)]
pub struct RecordingAction {
    id: String,
    calls: Arc<Mutex<u32>>,
    fail: Arc<Mutex<bool>>,
}

impl RecordingAction {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            calls: Arc::new(Mutex::new(0)),
            fail: Arc::new(Mutex::new(false)),
        }
    }

    pub fn failing(id: &str) -> Self {
        let action = Self::new(id);
        *action.fail.lock() = true;
        action
    }

    pub fn shared(&self) -> Arc<dyn TriggerAction> {
        Arc::new(self.clone())
    }

    pub fn calls(&self) -> u32 {
        *self.calls.lock()
    }
}

#[async_trait]
impl TriggerAction for RecordingAction {
    fn id(&self) -> &str {
        &self.id
    }

    fn action_type(&self) -> &str {
        RECORDING_ACTION_TYPE
    }

    fn description(&self) -> String {
        format!("record {}", self.id)
    }

    async fn do_action(&self) -> Result<(), ActionError> {
        *self.calls.lock() += 1;
        if *self.fail.lock() {
            return Err(ActionError::Failed {
                id: self.id.clone(),
                message: "injected failure".to_string(),
            });
        }
        Ok(())
    }

    fn to_json(&self) -> Result<Value, ActionError> {
        Ok(serde_json::json!({ "id": self.id, "fail": *self.fail.lock() }))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Register [`FlagChecker`] and [`RecordingAction`].
pub fn register_test_types(registries: &Registries) {
    registries
        .checkers
        .register(FLAG_CHECKER_TYPE, |state: &Value| {
            Ok(Box::new(FlagChecker::from_json(state)?) as Box<dyn ConditionChecker>)
        });
    registries
        .actions
        .register(RECORDING_ACTION_TYPE, |state: &Value| {
            let id = state.get("id").and_then(Value::as_str).unwrap_or("recording");
            let action = if state.get("fail").and_then(Value::as_bool) == Some(true) {
                RecordingAction::failing(id)
            } else {
                RecordingAction::new(id)
            };
            Ok(Arc::new(action) as Arc<dyn TriggerAction>)
        });
}
