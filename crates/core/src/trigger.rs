// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Triggers: a trigger condition, an expire condition and the actions run
//! when either is met.

use crate::action::{ActionError, TriggerAction};
use crate::condition::{Condition, ConditionError};
use crate::registry::{Registries, RegistryError};
use crate::time_fmt::format_epoch_ms;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Checker ids with this prefix mark the end-time expire condition that
/// pauses a trigger instead of expiring it.
pub const END_TIME_CHECKER_PREFIX: &str = "EndTimeChecker";

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("invalid trigger document: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Condition(#[from] ConditionError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Action(#[from] ActionError),
}

/// Identifier assigned by the trigger store.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TriggerId(pub i64);

impl TriggerId {
    /// Id of a trigger that has not been persisted yet.
    pub const UNASSIGNED: TriggerId = TriggerId(-1);

    pub fn is_assigned(&self) -> bool {
        self.0 >= 0
    }
}

impl fmt::Display for TriggerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TriggerStatus {
    Ready,
    Paused,
    Expired,
}

impl fmt::Display for TriggerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TriggerStatus::Ready => "READY",
            TriggerStatus::Paused => "PAUSED",
            TriggerStatus::Expired => "EXPIRED",
        })
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TriggerDoc {
    trigger_id: TriggerId,
    source: String,
    submit_user: String,
    submit_time: i64,
    last_modify_time: i64,
    status: TriggerStatus,
    trigger_condition: Value,
    expire_condition: Value,
    actions: Vec<ActionDoc>,
    #[serde(default)]
    expire_actions: Vec<ActionDoc>,
    reset_on_trigger: bool,
    reset_on_expire: bool,
    #[serde(default)]
    back_execute_once_on_miss: bool,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ActionDoc {
    #[serde(rename = "type")]
    action_type: String,
    action_state: Value,
}

#[derive(Debug, Clone)]
pub struct Trigger {
    id: TriggerId,
    source: String,
    submit_user: String,
    submit_time: i64,
    last_modify_time: i64,
    status: TriggerStatus,
    trigger_condition: Condition,
    expire_condition: Condition,
    actions: Vec<Arc<dyn TriggerAction>>,
    expire_actions: Vec<Arc<dyn TriggerAction>>,
    reset_on_trigger: bool,
    reset_on_expire: bool,
    back_execute_once_on_miss: bool,
}

impl Trigger {
    pub fn builder(trigger_condition: Condition, expire_condition: Condition) -> TriggerBuilder {
        TriggerBuilder {
            trigger: Trigger {
                id: TriggerId::UNASSIGNED,
                source: String::new(),
                submit_user: String::new(),
                submit_time: 0,
                last_modify_time: 0,
                status: TriggerStatus::Ready,
                trigger_condition,
                expire_condition,
                actions: Vec::new(),
                expire_actions: Vec::new(),
                reset_on_trigger: true,
                reset_on_expire: true,
                back_execute_once_on_miss: false,
            },
        }
    }

    pub fn id(&self) -> TriggerId {
        self.id
    }

    pub fn set_id(&mut self, id: TriggerId) {
        self.id = id;
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn submit_user(&self) -> &str {
        &self.submit_user
    }

    pub fn submit_time(&self) -> i64 {
        self.submit_time
    }

    pub fn last_modify_time(&self) -> i64 {
        self.last_modify_time
    }

    pub fn set_last_modify_time(&mut self, at: i64) {
        self.last_modify_time = at;
    }

    pub fn status(&self) -> TriggerStatus {
        self.status
    }

    pub fn set_status(&mut self, status: TriggerStatus) {
        self.status = status;
    }

    pub fn trigger_condition(&self) -> &Condition {
        &self.trigger_condition
    }

    pub fn expire_condition(&self) -> &Condition {
        &self.expire_condition
    }

    pub fn actions(&self) -> &[Arc<dyn TriggerAction>] {
        &self.actions
    }

    pub fn expire_actions(&self) -> &[Arc<dyn TriggerAction>] {
        &self.expire_actions
    }

    /// First action of concrete type `T`.
    pub fn find_action<T: 'static>(&self) -> Option<&T> {
        self.actions
            .iter()
            .find_map(|a| a.as_any().downcast_ref::<T>())
    }

    pub fn reset_on_trigger(&self) -> bool {
        self.reset_on_trigger
    }

    pub fn reset_on_expire(&self) -> bool {
        self.reset_on_expire
    }

    pub fn back_execute_once_on_miss(&self) -> bool {
        self.back_execute_once_on_miss
    }

    /// Earliest next check time of the two conditions.
    pub fn next_check_time(&self) -> i64 {
        self.trigger_condition
            .next_check_time()
            .min(self.expire_condition.next_check_time())
    }

    pub fn update_next_check_time(&mut self) {
        self.trigger_condition.update_next_check_time();
        self.expire_condition.update_next_check_time();
    }

    pub fn trigger_condition_met(&self) -> Result<bool, ConditionError> {
        self.trigger_condition.is_met()
    }

    pub fn expire_condition_met(&self) -> Result<bool, ConditionError> {
        self.expire_condition.is_met()
    }

    pub fn reset_trigger_condition(&mut self) {
        self.trigger_condition.reset();
    }

    pub fn reset_expire_condition(&mut self) {
        self.expire_condition.reset();
    }

    /// True when the expire condition is the end-time kind, which pauses
    /// the trigger rather than expiring it.
    pub fn has_end_time_expiry(&self) -> bool {
        self.expire_condition
            .checkers()
            .any(|c| c.id().starts_with(END_TIME_CHECKER_PREFIX))
    }

    pub fn stop_checkers(&mut self) {
        self.trigger_condition.stop();
        self.expire_condition.stop();
    }

    /// Fire times the trigger condition stepped over without firing.
    pub fn take_missed_check_times(&mut self) -> Vec<i64> {
        self.trigger_condition.take_missed_check_times()
    }

    pub fn description(&self) -> String {
        let actions: Vec<String> = self.actions.iter().map(|a| a.description()).collect();
        format!(
            "trigger {} from {} by {} at {}: [{}] when {} (next check {})",
            self.id,
            self.source,
            self.submit_user,
            format_epoch_ms(self.submit_time),
            actions.join(", "),
            self.trigger_condition.expression(),
            format_epoch_ms(self.next_check_time()),
        )
    }

    pub fn to_json(&self) -> Result<Value, CodecError> {
        let doc = TriggerDoc {
            trigger_id: self.id,
            source: self.source.clone(),
            submit_user: self.submit_user.clone(),
            submit_time: self.submit_time,
            last_modify_time: self.last_modify_time,
            status: self.status,
            trigger_condition: self.trigger_condition.to_json()?,
            expire_condition: self.expire_condition.to_json()?,
            actions: actions_to_docs(&self.actions)?,
            expire_actions: actions_to_docs(&self.expire_actions)?,
            reset_on_trigger: self.reset_on_trigger,
            reset_on_expire: self.reset_on_expire,
            back_execute_once_on_miss: self.back_execute_once_on_miss,
        };
        Ok(serde_json::to_value(doc)?)
    }

    /// Rebuild a trigger, constructing checkers and actions through the
    /// registries.
    pub fn from_json(value: &Value, registries: &Registries) -> Result<Self, CodecError> {
        let doc: TriggerDoc = serde_json::from_value(value.clone())?;
        let decode_actions = |docs: &[ActionDoc]| {
            docs.iter()
                .map(|a| registries.actions.create(&a.action_type, &a.action_state))
                .collect::<Result<Vec<_>, RegistryError>>()
        };
        Ok(Self {
            id: doc.trigger_id,
            source: doc.source,
            submit_user: doc.submit_user,
            submit_time: doc.submit_time,
            last_modify_time: doc.last_modify_time,
            status: doc.status,
            trigger_condition: Condition::from_json(&doc.trigger_condition, &registries.checkers)?,
            expire_condition: Condition::from_json(&doc.expire_condition, &registries.checkers)?,
            actions: decode_actions(&doc.actions)?,
            expire_actions: decode_actions(&doc.expire_actions)?,
            reset_on_trigger: doc.reset_on_trigger,
            reset_on_expire: doc.reset_on_expire,
            back_execute_once_on_miss: doc.back_execute_once_on_miss,
        })
    }
}

fn actions_to_docs(actions: &[Arc<dyn TriggerAction>]) -> Result<Vec<ActionDoc>, ActionError> {
    actions
        .iter()
        .map(|a| {
            Ok(ActionDoc {
                action_type: a.action_type().to_string(),
                action_state: a.to_json()?,
            })
        })
        .collect()
}

/// Builder for [`Trigger`]; new triggers are READY and reset on trigger
/// and expire unless told otherwise.
pub struct TriggerBuilder {
    trigger: Trigger,
}

impl TriggerBuilder {
    pub fn id(mut self, id: TriggerId) -> Self {
        self.trigger.id = id;
        self
    }

    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.trigger.source = source.into();
        self
    }

    pub fn submit_user(mut self, user: impl Into<String>) -> Self {
        self.trigger.submit_user = user.into();
        self
    }

    /// Sets both submit and last-modify times.
    pub fn submit_time(mut self, at: i64) -> Self {
        self.trigger.submit_time = at;
        self.trigger.last_modify_time = at;
        self
    }

    pub fn status(mut self, status: TriggerStatus) -> Self {
        self.trigger.status = status;
        self
    }

    pub fn action(mut self, action: Arc<dyn TriggerAction>) -> Self {
        self.trigger.actions.push(action);
        self
    }

    pub fn actions(mut self, actions: Vec<Arc<dyn TriggerAction>>) -> Self {
        self.trigger.actions = actions;
        self
    }

    pub fn expire_actions(mut self, actions: Vec<Arc<dyn TriggerAction>>) -> Self {
        self.trigger.expire_actions = actions;
        self
    }

    pub fn reset_on_trigger(mut self, reset: bool) -> Self {
        self.trigger.reset_on_trigger = reset;
        self
    }

    pub fn reset_on_expire(mut self, reset: bool) -> Self {
        self.trigger.reset_on_expire = reset;
        self
    }

    pub fn back_execute_once_on_miss(mut self, enabled: bool) -> Self {
        self.trigger.back_execute_once_on_miss = enabled;
        self
    }

    pub fn build(self) -> Trigger {
        self.trigger
    }
}

#[cfg(test)]
#[path = "trigger_tests.rs"]
mod tests;
