// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake flow executor for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{ExecuteError, FlowExecutionRequest, FlowExecutor};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;

/// Scripted result for the next executions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecuteOutcome {
    #[default]
    Started,
    Skipped,
    Failed,
}

#[derive(Default)]
struct FakeExecutorState {
    requests: Vec<FlowExecutionRequest>,
    outcome: ExecuteOutcome,
}

/// Records every request; clones share state.
#[derive(Clone, Default)]
pub struct FakeFlowExecutor {
    inner: Arc<Mutex<FakeExecutorState>>,
}

impl FakeFlowExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requests(&self) -> Vec<FlowExecutionRequest> {
        self.inner.lock().requests.clone()
    }

    pub fn set_outcome(&self, outcome: ExecuteOutcome) {
        self.inner.lock().outcome = outcome;
    }
}

#[async_trait]
impl FlowExecutor for FakeFlowExecutor {
    async fn execute_flow(&self, request: &FlowExecutionRequest) -> Result<(), ExecuteError> {
        let mut inner = self.inner.lock();
        inner.requests.push(request.clone());
        match inner.outcome {
            ExecuteOutcome::Started => Ok(()),
            ExecuteOutcome::Skipped => Err(ExecuteError::Skipped("already running".to_string())),
            ExecuteOutcome::Failed => Err(ExecuteError::Failed("injected failure".to_string())),
        }
    }
}
