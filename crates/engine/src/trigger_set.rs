// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Live trigger set ordered by next check time.

use cadence_core::{Trigger, TriggerId};
use std::collections::{BTreeSet, HashMap};

/// Triggers keyed by id with a secondary index on next check time.
///
/// Triggers are only reachable by shared reference; changing one means
/// taking it out with [`TriggerSet::remove`] and inserting it back, so the
/// index key always matches the stored trigger.
#[derive(Debug, Default)]
pub struct TriggerSet {
    triggers: HashMap<TriggerId, Trigger>,
    by_next_check: BTreeSet<(i64, TriggerId)>,
}

impl TriggerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace, returning the replaced trigger.
    pub fn insert(&mut self, trigger: Trigger) -> Option<Trigger> {
        let id = trigger.id();
        let previous = self.remove(id);
        self.by_next_check.insert((trigger.next_check_time(), id));
        self.triggers.insert(id, trigger);
        previous
    }

    pub fn remove(&mut self, id: TriggerId) -> Option<Trigger> {
        let trigger = self.triggers.remove(&id)?;
        self.by_next_check.remove(&(trigger.next_check_time(), id));
        Some(trigger)
    }

    pub fn get(&self, id: TriggerId) -> Option<&Trigger> {
        self.triggers.get(&id)
    }

    pub fn contains(&self, id: TriggerId) -> bool {
        self.triggers.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.triggers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triggers.is_empty()
    }

    /// All triggers in next-check order.
    pub fn iter(&self) -> impl Iterator<Item = &Trigger> + '_ {
        self.by_next_check
            .iter()
            .filter_map(|(_, id)| self.triggers.get(id))
    }

    /// Snapshot of ids in next-check order, earliest first.
    pub fn ids_by_next_check(&self) -> Vec<TriggerId> {
        self.by_next_check.iter().map(|(_, id)| *id).collect()
    }
}

#[cfg(test)]
#[path = "trigger_set_tests.rs"]
mod tests;
