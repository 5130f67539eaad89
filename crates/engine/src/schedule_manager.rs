// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Flow schedules indexed by id and by flow, backed by triggers.

use crate::error::{ScheduleManagerError, TriggerManagerError};
use crate::schedule_loader::{ScheduleUpdate, TriggerBasedScheduleLoader};
use cadence_core::{Schedule, SharedClock, TriggerId, TriggerStatus};
use std::collections::HashMap;
use tokio::sync::Mutex;

type FlowKey = (i64, String);

fn flow_key(schedule: &Schedule) -> FlowKey {
    (schedule.project_id, schedule.flow_id.clone())
}

#[derive(Default)]
struct ScheduleIndex {
    by_id: HashMap<TriggerId, Schedule>,
    by_flow: HashMap<FlowKey, TriggerId>,
}

impl ScheduleIndex {
    fn put(&mut self, schedule: Schedule) {
        let id = schedule.schedule_id;
        if let Some(old) = self.by_id.get(&id) {
            let old_key = flow_key(old);
            if self.by_flow.get(&old_key) == Some(&id) {
                self.by_flow.remove(&old_key);
            }
        }
        self.by_flow.insert(flow_key(&schedule), id);
        self.by_id.insert(id, schedule);
    }

    fn remove(&mut self, id: TriggerId) -> Option<Schedule> {
        let schedule = self.by_id.remove(&id)?;
        let key = flow_key(&schedule);
        if self.by_flow.get(&key) == Some(&id) {
            self.by_flow.remove(&key);
        }
        Some(schedule)
    }

    fn apply(&mut self, schedule: Schedule) {
        if schedule.status == TriggerStatus::Expired {
            self.remove(schedule.schedule_id);
        } else {
            self.put(schedule);
        }
    }
}

/// Schedule CRUD on top of the trigger manager.
///
/// Operations are serialized; the index is refreshed from trigger updates
/// before it is read.
pub struct ScheduleManager {
    loader: TriggerBasedScheduleLoader,
    clock: SharedClock,
    index: Mutex<ScheduleIndex>,
}

impl ScheduleManager {
    pub fn new(loader: TriggerBasedScheduleLoader, clock: SharedClock) -> Self {
        Self {
            loader,
            clock,
            index: Mutex::new(ScheduleIndex::default()),
        }
    }

    /// Index every stored schedule. Returns how many were loaded.
    pub async fn load(&self) -> usize {
        let schedules = self.loader.load_all_schedules().await;
        let mut index = self.index.lock().await;
        let count = schedules.len();
        for schedule in schedules {
            index.apply(schedule);
        }
        tracing::info!(schedules = count, "schedules loaded");
        count
    }

    /// Schedule a flow submitted now.
    ///
    /// The recurrence on `schedule` picks a period, cron or one-shot
    /// schedule.
    pub async fn schedule_flow(&self, mut schedule: Schedule) -> Result<Schedule, ScheduleManagerError> {
        schedule.submit_time = self.clock.epoch_ms();
        tracing::info!(schedule = %schedule.description(), "scheduling flow");
        self.insert_schedule(&mut schedule).await?;
        Ok(schedule)
    }

    /// Store a schedule, replacing the flow's existing schedule in place.
    ///
    /// A live schedule with the same definition is kept as is, so its
    /// trigger keeps its next fire time and any misses it has recorded;
    /// `schedule` is overwritten with the stored copy.
    pub async fn insert_schedule(&self, schedule: &mut Schedule) -> Result<(), ScheduleManagerError> {
        let mut index = self.index.lock().await;
        if let Some(id) = index.by_flow.get(&flow_key(schedule)).copied() {
            if let Some(current) = self.refresh_one(&mut index, id).await? {
                if current.status == TriggerStatus::Ready && current.same_definition(schedule) {
                    tracing::debug!(schedule_id = %id, "schedule unchanged, keeping live trigger");
                    *schedule = current;
                    return Ok(());
                }
            }
        }
        if !schedule.update_time(self.clock.epoch_ms()) {
            tracing::error!(
                project_id = schedule.project_id,
                flow = %schedule.flow_id,
                "schedule has no occurrence in the future"
            );
            return Err(ScheduleManagerError::InPast(schedule.description()));
        }

        match index.by_flow.get(&flow_key(schedule)).copied() {
            Some(id) => {
                schedule.schedule_id = id;
                match self.loader.update_schedule(schedule).await {
                    Err(ScheduleManagerError::TriggerManager(TriggerManagerError::NotFound(_))) => {
                        // The old trigger finished and was removed.
                        index.remove(id);
                        schedule.schedule_id = TriggerId::UNASSIGNED;
                        self.loader.insert_schedule(schedule).await?;
                    }
                    other => other?,
                }
            }
            None => self.loader.insert_schedule(schedule).await?,
        }
        tracing::info!(
            schedule_id = %schedule.schedule_id,
            next = %cadence_core::format_epoch_ms(schedule.next_exec_time),
            "schedule stored"
        );
        index.put(schedule.clone());
        Ok(())
    }

    pub async fn remove_schedule(&self, id: TriggerId) -> Result<Schedule, ScheduleManagerError> {
        let mut index = self.index.lock().await;
        let schedule = index
            .remove(id)
            .ok_or(ScheduleManagerError::NotFound(id))?;
        match self.loader.remove_schedule(id).await {
            Ok(())
            | Err(ScheduleManagerError::TriggerManager(TriggerManagerError::NotFound(_))) => {
                tracing::info!(schedule_id = %id, "schedule removed");
                Ok(schedule)
            }
            Err(e) => {
                tracing::error!(schedule_id = %id, error = %e, "failed to remove schedule");
                Err(e)
            }
        }
    }

    pub async fn get_schedule(&self, id: TriggerId) -> Result<Option<Schedule>, ScheduleManagerError> {
        let mut index = self.index.lock().await;
        self.refresh_one(&mut index, id).await
    }

    pub async fn get_schedule_by_flow(
        &self,
        project_id: i64,
        flow_id: &str,
    ) -> Result<Option<Schedule>, ScheduleManagerError> {
        let mut index = self.index.lock().await;
        let Some(id) = index
            .by_flow
            .get(&(project_id, flow_id.to_string()))
            .copied()
        else {
            return Ok(None);
        };
        self.refresh_one(&mut index, id).await
    }

    /// Every live schedule, by id.
    pub async fn get_schedules(&self) -> Vec<Schedule> {
        let mut index = self.index.lock().await;
        for schedule in self.loader.load_updated_schedules().await {
            index.apply(schedule);
        }
        let live = self.loader.live_ids().await;
        let stale: Vec<TriggerId> = index
            .by_id
            .keys()
            .filter(|id| !live.contains(id))
            .copied()
            .collect();
        for id in stale {
            tracing::debug!(schedule_id = %id, "dropping finished schedule");
            index.remove(id);
        }

        let mut schedules: Vec<Schedule> = index.by_id.values().cloned().collect();
        schedules.sort_by_key(|s| s.schedule_id);
        schedules
    }

    async fn refresh_one(
        &self,
        index: &mut ScheduleIndex,
        id: TriggerId,
    ) -> Result<Option<Schedule>, ScheduleManagerError> {
        match self.loader.load_updated_schedule(id).await? {
            ScheduleUpdate::Unchanged => Ok(index.by_id.get(&id).cloned()),
            ScheduleUpdate::Updated(schedule) => {
                index.apply((*schedule).clone());
                Ok(index.by_id.get(&id).cloned())
            }
            ScheduleUpdate::Gone => {
                index.remove(id);
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
#[path = "schedule_manager_tests.rs"]
mod tests;
