// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Conditions: a set of named checkers combined by a boolean expression.

use crate::checker::{CheckerError, ConditionChecker};
use crate::expr::{Expr, ExprError};
use crate::registry::{CheckerRegistry, RegistryError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConditionError {
    #[error(transparent)]
    Expr(#[from] ExprError),
    #[error(transparent)]
    Checker(#[from] CheckerError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("duplicate checker id '{0}'")]
    DuplicateChecker(String),
    #[error("invalid condition document: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConditionDoc {
    expression: String,
    checkers: Vec<CheckerDoc>,
    #[serde(default)]
    next_check_time: Option<i64>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CheckerDoc {
    #[serde(rename = "type")]
    checker_type: String,
    checker_state: Value,
}

#[derive(Debug, Clone)]
pub struct Condition {
    checkers: BTreeMap<String, Box<dyn ConditionChecker>>,
    expression: String,
    expr: Expr,
    next_check_time: i64,
}

impl Condition {
    pub fn new(
        checkers: Vec<Box<dyn ConditionChecker>>,
        expression: &str,
    ) -> Result<Self, ConditionError> {
        let expr = Expr::parse(expression)?;
        let mut map = BTreeMap::new();
        for checker in checkers {
            let id = checker.id().to_string();
            if map.insert(id.clone(), checker).is_some() {
                return Err(ConditionError::DuplicateChecker(id));
            }
        }
        let mut condition = Self {
            checkers: map,
            expression: expression.to_string(),
            expr,
            next_check_time: i64::MAX,
        };
        condition.update_next_check_time();
        Ok(condition)
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn checkers(&self) -> impl Iterator<Item = &dyn ConditionChecker> + '_ {
        self.checkers.values().map(|c| c.as_ref())
    }

    pub fn checker(&self, id: &str) -> Option<&dyn ConditionChecker> {
        self.checkers.get(id).map(|c| c.as_ref())
    }

    /// First checker of concrete type `T`.
    pub fn find_checker<T: 'static>(&self) -> Option<&T> {
        self.checkers
            .values()
            .find_map(|c| c.as_any().downcast_ref::<T>())
    }

    /// Add or replace a checker.
    pub fn insert_checker(&mut self, checker: Box<dyn ConditionChecker>) {
        self.checkers.insert(checker.id().to_string(), checker);
        self.update_next_check_time();
    }

    /// Minimum next check time over all checkers; `i64::MAX` when empty.
    pub fn next_check_time(&self) -> i64 {
        self.next_check_time
    }

    pub fn update_next_check_time(&mut self) {
        self.next_check_time = self
            .checkers
            .values()
            .map(|c| c.next_check_time())
            .min()
            .unwrap_or(i64::MAX);
    }

    /// Evaluate the expression; only a definite `true` counts as met.
    pub fn is_met(&self) -> Result<bool, ConditionError> {
        let result = self.expr.evaluate(&mut |id: &str| -> Result<Value, ConditionError> {
            let checker = self
                .checkers
                .get(id)
                .ok_or_else(|| ExprError::UnknownChecker(id.to_string()))?;
            Ok(checker.eval()?)
        })?;
        Ok(result == Some(true))
    }

    pub fn reset(&mut self) {
        for checker in self.checkers.values_mut() {
            checker.reset();
        }
        self.update_next_check_time();
    }

    pub fn stop(&mut self) {
        for checker in self.checkers.values_mut() {
            checker.stop();
        }
    }

    /// Fire times every checker skipped over, sorted and deduplicated.
    pub fn take_missed_check_times(&mut self) -> Vec<i64> {
        let mut missed: Vec<i64> = self
            .checkers
            .values_mut()
            .flat_map(|c| c.take_missed_check_times())
            .collect();
        missed.sort_unstable();
        missed.dedup();
        missed
    }

    pub fn to_json(&self) -> Result<Value, ConditionError> {
        let checkers = self
            .checkers
            .values()
            .map(|c| {
                Ok(CheckerDoc {
                    checker_type: c.checker_type().to_string(),
                    checker_state: c.to_json()?,
                })
            })
            .collect::<Result<Vec<_>, CheckerError>>()?;
        let doc = ConditionDoc {
            expression: self.expression.clone(),
            checkers,
            next_check_time: Some(self.next_check_time),
        };
        Ok(serde_json::to_value(doc)?)
    }

    /// Rebuild from a document, constructing checkers through `registry`.
    pub fn from_json(value: &Value, registry: &CheckerRegistry) -> Result<Self, ConditionError> {
        let doc: ConditionDoc = serde_json::from_value(value.clone())?;
        let checkers = doc
            .checkers
            .iter()
            .map(|c| registry.create(&c.checker_type, &c.checker_state))
            .collect::<Result<Vec<_>, RegistryError>>()?;
        Self::new(checkers, &doc.expression)
    }
}

#[cfg(test)]
#[path = "condition_tests.rs"]
mod tests;
