// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stores schedules as triggers.
//!
//! A schedule becomes a trigger with one time checker as its trigger
//! condition, an end-time checker as its expire condition and one
//! execute-flow action. The reverse mapping pulls those three back out.

use crate::error::ScheduleManagerError;
use crate::execute_flow::{ExecuteFlowAction, EXECUTE_FLOW_ACTION_ID};
use crate::trigger_manager::TriggerManager;
use cadence_adapters::{FlowExecutionRequest, FlowExecutor};
use cadence_core::{
    BasicTimeChecker, Condition, ConditionChecker, Schedule, Trigger, TriggerId,
    DEFAULT_SCHEDULE_END_EPOCH_MS, END_TIME_CHECKER_PREFIX,
};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

pub const BASIC_TIME_CHECKER_ID: &str = "BasicTimeChecker_1";
pub const END_TIME_CHECKER_ID: &str = "EndTimeChecker_1";

/// Result of checking one schedule for changes.
#[derive(Debug, Clone, PartialEq)]
pub enum ScheduleUpdate {
    Unchanged,
    Updated(Box<Schedule>),
    /// The backing trigger no longer exists.
    Gone,
}

pub struct TriggerBasedScheduleLoader {
    triggers: TriggerManager,
    executor: Arc<dyn FlowExecutor>,
    /// Last modify time seen per schedule.
    last_check_times: parking_lot::Mutex<HashMap<TriggerId, i64>>,
}

impl TriggerBasedScheduleLoader {
    pub fn new(triggers: TriggerManager, executor: Arc<dyn FlowExecutor>) -> Self {
        Self {
            triggers,
            executor,
            last_check_times: parking_lot::Mutex::new(HashMap::new()),
        }
    }

    pub fn source(&self) -> &str {
        self.triggers.owned_source()
    }

    pub fn schedule_to_trigger(&self, schedule: &Schedule) -> Result<Trigger, ScheduleManagerError> {
        let clock = self.triggers.clock();
        let checker = BasicTimeChecker::new(
            BASIC_TIME_CHECKER_ID,
            schedule.first_sched_time,
            schedule.timezone,
            schedule.is_recurring(),
            schedule.skip_past_occurrences,
            schedule.recurrence.clone(),
            Arc::clone(clock),
        );
        let trigger_condition = Condition::new(
            vec![Box::new(checker)],
            &format!("{BASIC_TIME_CHECKER_ID}.eval()"),
        )?;

        let end = BasicTimeChecker::end_time(
            END_TIME_CHECKER_ID,
            schedule.first_sched_time,
            schedule.end_sched_time,
            schedule.timezone,
            Arc::clone(clock),
        );
        let expire_condition =
            Condition::new(vec![Box::new(end)], &format!("{END_TIME_CHECKER_ID}.eval()"))?;

        let action = ExecuteFlowAction::new(
            EXECUTE_FLOW_ACTION_ID,
            FlowExecutionRequest {
                project_id: schedule.project_id,
                project_name: schedule.project_name.clone(),
                flow_id: schedule.flow_id.clone(),
                submit_user: schedule.submit_user.clone(),
                options: schedule.execution_options.clone(),
            },
            Arc::clone(&self.executor),
        );

        Ok(Trigger::builder(trigger_condition, expire_condition)
            .id(schedule.schedule_id)
            .source(self.source())
            .submit_user(schedule.submit_user.clone())
            .submit_time(schedule.submit_time)
            .status(schedule.status)
            .action(Arc::new(action))
            .reset_on_trigger(schedule.is_recurring())
            .back_execute_once_on_miss(schedule.back_execute_once_on_miss)
            .build())
    }

    /// Store a new schedule, assigning its id.
    pub async fn insert_schedule(&self, schedule: &mut Schedule) -> Result<(), ScheduleManagerError> {
        let trigger = self.schedule_to_trigger(schedule)?;
        let id = self.triggers.insert_trigger(trigger).await?;
        schedule.schedule_id = id;
        schedule.last_modify_time = self.triggers.clock().epoch_ms();
        Ok(())
    }

    pub async fn update_schedule(&self, schedule: &mut Schedule) -> Result<(), ScheduleManagerError> {
        let trigger = self.schedule_to_trigger(schedule)?;
        self.triggers.update_trigger(trigger).await?;
        schedule.last_modify_time = self.triggers.clock().epoch_ms();
        Ok(())
    }

    pub async fn remove_schedule(&self, id: TriggerId) -> Result<(), ScheduleManagerError> {
        self.last_check_times.lock().remove(&id);
        self.triggers.remove_trigger(id).await?;
        Ok(())
    }

    /// Every schedule backed by a live trigger. Triggers that do not parse
    /// as schedules are logged and skipped.
    pub async fn load_all_schedules(&self) -> Vec<Schedule> {
        let triggers = self.triggers.get_triggers_by_source(self.source()).await;
        let mut seen = self.last_check_times.lock();
        triggers
            .iter()
            .filter_map(|t| {
                let entry = seen.entry(t.id()).or_insert(-1);
                *entry = (*entry).max(t.last_modify_time());
                parse_or_log(t)
            })
            .collect()
    }

    /// Schedules whose triggers changed since they were last seen.
    pub async fn load_updated_schedules(&self) -> Vec<Schedule> {
        let triggers = self.triggers.get_triggers_by_source(self.source()).await;
        let mut seen = self.last_check_times.lock();
        triggers
            .iter()
            .filter_map(|t| {
                let last = seen.get(&t.id()).copied().unwrap_or(-1);
                if t.last_modify_time() <= last {
                    return None;
                }
                seen.insert(t.id(), t.last_modify_time());
                parse_or_log(t)
            })
            .collect()
    }

    pub async fn load_updated_schedule(
        &self,
        id: TriggerId,
    ) -> Result<ScheduleUpdate, ScheduleManagerError> {
        let last = self.last_check_times.lock().get(&id).copied().unwrap_or(-1);
        if let Some(trigger) = self.triggers.get_updated_trigger_by_id(id, last).await {
            self.last_check_times
                .lock()
                .insert(id, trigger.last_modify_time());
            return Ok(ScheduleUpdate::Updated(Box::new(trigger_to_schedule(&trigger)?)));
        }
        if self.triggers.get_trigger(id).await.is_none() {
            self.last_check_times.lock().remove(&id);
            return Ok(ScheduleUpdate::Gone);
        }
        Ok(ScheduleUpdate::Unchanged)
    }

    /// Ids of every live schedule trigger.
    pub async fn live_ids(&self) -> BTreeSet<TriggerId> {
        self.triggers
            .get_triggers_by_source(self.source())
            .await
            .iter()
            .map(|t| t.id())
            .collect()
    }
}

fn parse_or_log(trigger: &Trigger) -> Option<Schedule> {
    match trigger_to_schedule(trigger) {
        Ok(schedule) => {
            tracing::debug!(
                schedule_id = %schedule.schedule_id,
                project_id = schedule.project_id,
                flow = %schedule.flow_id,
                "loaded schedule"
            );
            Some(schedule)
        }
        Err(e) => {
            tracing::error!(trigger_id = %trigger.id(), error = %e, "skipping trigger");
            None
        }
    }
}

/// Rebuild the schedule view of a trigger created by
/// [`TriggerBasedScheduleLoader::schedule_to_trigger`].
pub fn trigger_to_schedule(trigger: &Trigger) -> Result<Schedule, ScheduleManagerError> {
    let invalid = |reason: &str| ScheduleManagerError::InvalidTrigger {
        id: trigger.id(),
        reason: reason.to_string(),
    };
    let checker = trigger
        .trigger_condition()
        .find_checker::<BasicTimeChecker>()
        .ok_or_else(|| invalid("no time checker in trigger condition"))?;
    let action = trigger
        .find_action::<ExecuteFlowAction>()
        .ok_or_else(|| invalid("no execute-flow action"))?;

    let expire = trigger.expire_condition();
    let end_sched_time = if expire.expression().contains(END_TIME_CHECKER_PREFIX) {
        expire
            .find_checker::<BasicTimeChecker>()
            .map(|c| c.next_check_time())
            .unwrap_or(DEFAULT_SCHEDULE_END_EPOCH_MS)
    } else {
        DEFAULT_SCHEDULE_END_EPOCH_MS
    };

    Ok(Schedule {
        schedule_id: trigger.id(),
        project_id: action.project_id(),
        project_name: action.project_name().to_string(),
        flow_id: action.flow_id().to_string(),
        first_sched_time: checker.first_check_time(),
        end_sched_time,
        timezone: checker.timezone(),
        recurrence: checker.recurrence().clone(),
        submit_user: trigger.submit_user().to_string(),
        submit_time: trigger.submit_time(),
        last_modify_time: trigger.last_modify_time(),
        status: trigger.status(),
        next_exec_time: checker.next_check_time(),
        execution_options: action.options().clone(),
        skip_past_occurrences: checker.skip_past_checks(),
        back_execute_once_on_miss: trigger.back_execute_once_on_miss(),
    })
}

#[cfg(test)]
#[path = "schedule_loader_tests.rs"]
mod tests;
