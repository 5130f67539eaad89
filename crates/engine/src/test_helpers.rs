// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for the engine crate.

use crate::builtin::register_builtin_types;
use crate::config::ScannerConfig;
use crate::trigger_manager::{MissedScheduleSink, TriggerManager};
use cadence_adapters::FakeFlowExecutor;
use cadence_core::test_support::{register_test_types, FlagChecker, RecordingAction};
use async_trait::async_trait;
use cadence_core::{
    ActionError, Condition, FakeClock, Registries, Trigger, TriggerAction, END_TIME_CHECKER_PREFIX,
};
use cadence_storage::{MemoryTriggerStore, TriggerLoader};
use parking_lot::Mutex;
use serde_json::Value;
use std::any::Any;
use std::sync::Arc;

pub(crate) const TEST_SOURCE: &str = "SimpleTimeTrigger";
pub(crate) const SCAN_INTERVAL_MS: u64 = 1_000;

/// Checker id with the end-time shape.
pub(crate) fn end_time_id() -> String {
    format!("{END_TIME_CHECKER_PREFIX}_1")
}

/// Everything a trigger manager test needs, wired to in-memory fakes.
pub(crate) struct TestContext {
    pub manager: TriggerManager,
    pub loader: TriggerLoader,
    pub store: MemoryTriggerStore,
    pub clock: FakeClock,
    pub executor: FakeFlowExecutor,
}

pub(crate) fn setup() -> TestContext {
    setup_with_sink(None)
}

pub(crate) fn setup_with_sink(sink: Option<Arc<dyn MissedScheduleSink>>) -> TestContext {
    let clock = FakeClock::new();
    let executor = FakeFlowExecutor::new();
    let registries = Registries::new();
    register_test_types(&registries);
    register_builtin_types(&registries, clock.shared(), Arc::new(executor.clone()));
    let registries = Arc::new(registries);

    let store = MemoryTriggerStore::new();
    let loader = TriggerLoader::new(Arc::new(store.clone()), Arc::clone(&registries), clock.shared());
    let config = ScannerConfig {
        scan_interval_ms: SCAN_INTERVAL_MS,
        owned_source: TEST_SOURCE.to_string(),
    };
    let manager = TriggerManager::new(loader.clone(), clock.shared(), &config, sink);
    TestContext {
        manager,
        loader,
        store,
        clock,
        executor,
    }
}

/// Handles onto a flag-driven trigger.
pub(crate) struct FlagTrigger {
    pub fire: FlagChecker,
    pub end: FlagChecker,
    pub action: RecordingAction,
    pub expire_action: RecordingAction,
}

impl FlagTrigger {
    pub fn new() -> Self {
        Self {
            fire: FlagChecker::new("fire", false, 1_000),
            end: FlagChecker::new(&end_time_id(), false, i64::MAX - 3_600_000),
            action: RecordingAction::new("act"),
            expire_action: RecordingAction::new("on-expire"),
        }
    }

    /// Trigger from `source` with an end-time expire condition.
    pub fn build(&self, source: &str, reset_on_trigger: bool) -> Trigger {
        let tc = Condition::new(vec![self.fire.boxed()], "fire.eval()").unwrap();
        let end_id = end_time_id();
        let ec = Condition::new(vec![self.end.boxed()], &format!("{end_id}.eval()"))
            .unwrap();
        Trigger::builder(tc, ec)
            .source(source)
            .submit_user("tester")
            .action(self.action.shared())
            .expire_actions(vec![self.expire_action.shared()])
            .reset_on_trigger(reset_on_trigger)
            .build()
    }
}

/// Sink that records every report.
#[derive(Default)]
pub(crate) struct RecordingSink {
    pub reports: Mutex<Vec<(i64, Vec<i64>)>>,
}

impl MissedScheduleSink for RecordingSink {
    fn report_missed(&self, trigger: &Trigger, missed: &[i64]) {
        self.reports.lock().push((trigger.id().0, missed.to_vec()));
    }
}

/// Action that panics when run.
#[derive(Debug)]
pub(crate) struct PanickingAction;

#[async_trait]
impl TriggerAction for PanickingAction {
    fn id(&self) -> &str {
        "panics"
    }

    fn action_type(&self) -> &str {
        "PanickingAction"
    }

    fn description(&self) -> String {
        "panic".to_string()
    }

    async fn do_action(&self) -> Result<(), ActionError> {
        panic!("action blew up");
    }

    fn to_json(&self) -> Result<Value, ActionError> {
        Ok(Value::Null)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
