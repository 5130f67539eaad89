// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Trigger actions: side effects run when a trigger fires or expires.

use async_trait::async_trait;
use serde_json::Value;
use std::any::Any;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ActionError {
    #[error("action {id} failed: {message}")]
    Failed { id: String, message: String },
    #[error("invalid action state: {0}")]
    InvalidState(String),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Side effect attached to a trigger.
///
/// Failures are reported per action; the trigger still transitions.
#[async_trait]
pub trait TriggerAction: Send + Sync + fmt::Debug {
    fn id(&self) -> &str;

    /// Registry tag written next to the serialized state.
    fn action_type(&self) -> &str;

    fn description(&self) -> String;

    async fn do_action(&self) -> Result<(), ActionError>;

    fn to_json(&self) -> Result<Value, ActionError>;

    fn as_any(&self) -> &dyn Any;
}
