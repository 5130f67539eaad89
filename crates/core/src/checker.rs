// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Condition checkers: stateful inputs to a condition's expression.

use serde_json::Value;
use std::any::Any;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CheckerError {
    #[error("checker {id} failed: {message}")]
    Failed { id: String, message: String },
    #[error("invalid checker state: {0}")]
    InvalidState(String),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A named input evaluated by a [`Condition`](crate::Condition).
///
/// Implementations are registered by type tag in a
/// [`CheckerRegistry`](crate::CheckerRegistry) so stored triggers can be
/// rebuilt from their JSON state.
pub trait ConditionChecker: Send + Sync + fmt::Debug {
    /// Unique within the owning condition; referenced by the expression.
    fn id(&self) -> &str;

    /// Registry tag written next to the serialized state.
    fn checker_type(&self) -> &str;

    /// Current output. Only a JSON boolean counts towards a met condition.
    fn eval(&self) -> Result<Value, CheckerError>;

    /// Earliest instant (epoch ms) at which `eval` may change.
    fn next_check_time(&self) -> i64;

    /// Re-arm after the owning trigger fired.
    fn reset(&mut self);

    /// Release resources when the owning trigger is removed.
    fn stop(&mut self) {}

    /// Serialized state, readable by the registered factory.
    fn to_json(&self) -> Result<Value, CheckerError>;

    fn clone_box(&self) -> Box<dyn ConditionChecker>;

    fn as_any(&self) -> &dyn Any;

    /// Fire times that were skipped over without firing since the last call.
    fn take_missed_check_times(&mut self) -> Vec<i64> {
        Vec::new()
    }
}

impl Clone for Box<dyn ConditionChecker> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}
