// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-schedule execution options carried to the flow executor.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Options forwarded with every execution a schedule starts.
///
/// Unknown keys are kept in `extra` so options written by newer versions
/// survive a load/save cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExecutionOptions {
    pub failure_emails: Vec<String>,
    pub failure_emails_override: bool,
    pub success_emails: Vec<String>,
    pub success_emails_override: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concurrent_option: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl ExecutionOptions {
    /// Recipients for failure notices: the overridden list when set,
    /// otherwise `flow_default`.
    pub fn failure_recipients(&self, flow_default: &[String]) -> Vec<String> {
        if self.failure_emails_override || flow_default.is_empty() {
            self.failure_emails.clone()
        } else {
            flow_default.to_vec()
        }
    }
}

#[cfg(test)]
#[path = "execution_tests.rs"]
mod tests;
