// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Flow execution adapters

mod command;
mod noop;

pub use command::{CommandFlowExecutor, SKIPPED_EXIT_CODE};
pub use noop::NoOpFlowExecutor;

#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{ExecuteOutcome, FakeFlowExecutor};

use async_trait::async_trait;
use cadence_core::ExecutionOptions;
use thiserror::Error;

/// Errors from flow execution
#[derive(Debug, Error)]
pub enum ExecuteError {
    /// The executor declined to start the flow (e.g. one is already
    /// running and concurrent runs are skipped). Not a failure.
    #[error("execution skipped: {0}")]
    Skipped(String),
    #[error("execution failed: {0}")]
    Failed(String),
}

/// What to run and on whose behalf.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowExecutionRequest {
    pub project_id: i64,
    pub project_name: String,
    pub flow_id: String,
    pub submit_user: String,
    pub options: ExecutionOptions,
}

/// Starts flow executions. Launching and monitoring the actual processes
/// is the implementation's business.
#[async_trait]
pub trait FlowExecutor: Send + Sync + 'static {
    async fn execute_flow(&self, request: &FlowExecutionRequest) -> Result<(), ExecuteError>;
}
