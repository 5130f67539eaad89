// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Executor that only logs.

use super::{ExecuteError, FlowExecutionRequest, FlowExecutor};
use async_trait::async_trait;

/// Used when no executor command is configured.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoOpFlowExecutor;

impl NoOpFlowExecutor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl FlowExecutor for NoOpFlowExecutor {
    async fn execute_flow(&self, request: &FlowExecutionRequest) -> Result<(), ExecuteError> {
        tracing::info!(
            project = %request.project_name,
            flow = %request.flow_id,
            user = %request.submit_user,
            "no executor configured, not running flow",
        );
        Ok(())
    }
}
