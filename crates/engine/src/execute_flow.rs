// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Trigger action that starts a flow execution.

use async_trait::async_trait;
use cadence_adapters::{ExecuteError, FlowExecutionRequest, FlowExecutor};
use cadence_core::{ActionError, ExecutionOptions, TriggerAction};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Registry tag of [`ExecuteFlowAction`].
pub const EXECUTE_FLOW_ACTION_TYPE: &str = "ExecuteFlowAction";

/// Action id used for schedule triggers.
pub const EXECUTE_FLOW_ACTION_ID: &str = "executeFlowAction";

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExecuteFlowState {
    action_id: String,
    project_id: i64,
    project_name: String,
    flow_name: String,
    submit_user: String,
    #[serde(default)]
    execution_options: ExecutionOptions,
}

#[derive(Clone)]
pub struct ExecuteFlowAction {
    id: String,
    request: FlowExecutionRequest,
    executor: Arc<dyn FlowExecutor>,
}

impl ExecuteFlowAction {
    pub fn new(
        id: impl Into<String>,
        request: FlowExecutionRequest,
        executor: Arc<dyn FlowExecutor>,
    ) -> Self {
        Self {
            id: id.into(),
            request,
            executor,
        }
    }

    pub fn from_json(state: &Value, executor: Arc<dyn FlowExecutor>) -> Result<Self, ActionError> {
        let state: ExecuteFlowState = serde_json::from_value(state.clone())?;
        Ok(Self {
            id: state.action_id,
            request: FlowExecutionRequest {
                project_id: state.project_id,
                project_name: state.project_name,
                flow_id: state.flow_name,
                submit_user: state.submit_user,
                options: state.execution_options,
            },
            executor,
        })
    }

    pub fn request(&self) -> &FlowExecutionRequest {
        &self.request
    }

    pub fn project_id(&self) -> i64 {
        self.request.project_id
    }

    pub fn project_name(&self) -> &str {
        &self.request.project_name
    }

    pub fn flow_id(&self) -> &str {
        &self.request.flow_id
    }

    pub fn submit_user(&self) -> &str {
        &self.request.submit_user
    }

    pub fn options(&self) -> &ExecutionOptions {
        &self.request.options
    }
}

impl fmt::Debug for ExecuteFlowAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecuteFlowAction")
            .field("id", &self.id)
            .field("request", &self.request)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl TriggerAction for ExecuteFlowAction {
    fn id(&self) -> &str {
        &self.id
    }

    fn action_type(&self) -> &str {
        EXECUTE_FLOW_ACTION_TYPE
    }

    fn description(&self) -> String {
        format!(
            "execute flow {} in project {} ({}) as {}",
            self.request.flow_id,
            self.request.project_name,
            self.request.project_id,
            self.request.submit_user
        )
    }

    async fn do_action(&self) -> Result<(), ActionError> {
        match self.executor.execute_flow(&self.request).await {
            Ok(()) => Ok(()),
            Err(ExecuteError::Skipped(reason)) => {
                tracing::info!(
                    project = %self.request.project_name,
                    flow = %self.request.flow_id,
                    %reason,
                    "flow execution skipped"
                );
                Ok(())
            }
            Err(ExecuteError::Failed(message)) => Err(ActionError::Failed {
                id: self.id.clone(),
                message,
            }),
        }
    }

    fn to_json(&self) -> Result<Value, ActionError> {
        let state = ExecuteFlowState {
            action_id: self.id.clone(),
            project_id: self.request.project_id,
            project_name: self.request.project_name.clone(),
            flow_name: self.request.flow_id.clone(),
            submit_user: self.request.submit_user.clone(),
            execution_options: self.request.options.clone(),
        };
        Ok(serde_json::to_value(state)?)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
#[path = "execute_flow_tests.rs"]
mod tests;
