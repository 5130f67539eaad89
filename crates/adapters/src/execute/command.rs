// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Executor that hands each flow to an external command.
//!
//! The command receives the flow identity in `CADENCE_*` environment
//! variables and the execution options as JSON in
//! `CADENCE_EXECUTION_OPTIONS`. Exit status 0 means started,
//! [`SKIPPED_EXIT_CODE`] means skipped, anything else is a failure.

use super::{ExecuteError, FlowExecutionRequest, FlowExecutor};
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Output;
use std::time::Duration;
use tokio::process::Command;

/// `EX_TEMPFAIL` from sysexits.h.
pub const SKIPPED_EXIT_CODE: i32 = 75;

#[derive(Clone, Debug)]
pub struct CommandFlowExecutor {
    program: PathBuf,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandFlowExecutor {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args,
            timeout,
        }
    }
}

impl CommandFlowExecutor {
    /// Run to completion within the timeout. The child is killed when the
    /// timeout drops it.
    async fn output(&self, mut cmd: Command, request: &FlowExecutionRequest) -> Result<Output, ExecuteError> {
        match tokio::time::timeout(self.timeout, cmd.output()).await {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(e)) => Err(ExecuteError::Failed(format!(
                "cannot run {} for {}.{}: {e}",
                self.program.display(),
                request.project_name,
                request.flow_id
            ))),
            Err(_) => Err(ExecuteError::Failed(format!(
                "flow command for {}.{} timed out after {}ms",
                request.project_name,
                request.flow_id,
                self.timeout.as_millis()
            ))),
        }
    }
}

#[async_trait]
impl FlowExecutor for CommandFlowExecutor {
    async fn execute_flow(&self, request: &FlowExecutionRequest) -> Result<(), ExecuteError> {
        let options = serde_json::to_string(&request.options)
            .map_err(|e| ExecuteError::Failed(format!("cannot encode options: {e}")))?;
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .env("CADENCE_PROJECT_ID", request.project_id.to_string())
            .env("CADENCE_PROJECT_NAME", &request.project_name)
            .env("CADENCE_FLOW_ID", &request.flow_id)
            .env("CADENCE_SUBMIT_USER", &request.submit_user)
            .env("CADENCE_EXECUTION_OPTIONS", options)
            .kill_on_drop(true);

        let output = self.output(cmd, request).await?;

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        exit_outcome(output.status.code(), stderr)
    }
}

fn exit_outcome(code: Option<i32>, stderr: String) -> Result<(), ExecuteError> {
    match code {
        Some(0) => Ok(()),
        Some(SKIPPED_EXIT_CODE) => Err(ExecuteError::Skipped(stderr)),
        Some(code) => Err(ExecuteError::Failed(format!("exit {code}: {stderr}"))),
        None => Err(ExecuteError::Failed(format!("terminated by signal: {stderr}"))),
    }
}

#[cfg(test)]
#[path = "command_tests.rs"]
mod tests;
