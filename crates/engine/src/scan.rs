// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One sweep of the trigger state machine over the live set.
//!
//! For each READY trigger:
//! 1. an end-time expire condition that is met runs the expire actions and
//!    pauses the trigger;
//! 2. otherwise a met trigger condition runs the actions, then rearms both
//!    conditions or expires the trigger;
//! 3. otherwise only the next check time moves.
//!
//! Expired triggers owned by this scheduler are then deleted. Failures are
//! contained to the trigger that raised them.

use crate::error::TriggerManagerError;
use crate::trigger_manager::MissedScheduleSink;
use crate::trigger_set::TriggerSet;
use cadence_core::{Trigger, TriggerAction, TriggerStatus};
use cadence_storage::TriggerLoader;
use futures::FutureExt;
use parking_lot::Mutex;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

/// Counts from one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanReport {
    pub checked: usize,
    pub fired: usize,
    pub paused: usize,
    pub expired: usize,
    pub removed: usize,
    pub failed: usize,
}

/// What happened to a single trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Transition {
    /// Not READY; left alone.
    Inactive,
    Waiting,
    Paused,
    /// Fired and rearmed.
    Fired,
    /// Fired for the last time.
    Expired,
}

pub(crate) struct Sweep<'a> {
    pub loader: &'a TriggerLoader,
    pub owned_source: &'a str,
    pub missed_sink: Option<&'a Arc<dyn MissedScheduleSink>>,
    pub stage: &'a Mutex<String>,
}

impl Sweep<'_> {
    /// Visit every trigger in the set, earliest next check first.
    ///
    /// A trigger whose checkers or actions panic is logged, counted as
    /// failed and put back; the sweep carries on with the next one.
    pub async fn run(&self, set: &mut TriggerSet) -> ScanReport {
        let mut report = ScanReport::default();
        for id in set.ids_by_next_check() {
            let Some(mut trigger) = set.remove(id) else {
                continue;
            };
            *self.stage.lock() = format!("Checking for trigger {id}");
            report.checked += 1;

            let outcome = AssertUnwindSafe(self.visit(&mut trigger, &mut report))
                .catch_unwind()
                .await;
            let keep = match outcome {
                Ok(keep) => keep,
                Err(panic) => {
                    tracing::error!(
                        trigger_id = %id,
                        panic = panic_message(&*panic),
                        "trigger panicked while being processed"
                    );
                    report.failed += 1;
                    true
                }
            };
            if keep {
                set.insert(trigger);
            }
        }
        report
    }

    /// Apply one transition. Returns false once the trigger is deleted.
    async fn visit(&self, trigger: &mut Trigger, report: &mut ScanReport) -> bool {
        let id = trigger.id();
        match self.transition(trigger).await {
            Ok(Transition::Paused) => report.paused += 1,
            Ok(Transition::Fired) => report.fired += 1,
            Ok(Transition::Expired) => {
                report.fired += 1;
                report.expired += 1;
            }
            Ok(Transition::Inactive | Transition::Waiting) => {}
            Err(e) => {
                tracing::error!(trigger_id = %id, error = %e, "failed to process trigger");
                report.failed += 1;
            }
        }

        let missed = trigger.take_missed_check_times();
        if !missed.is_empty() {
            match self.missed_sink {
                Some(sink) => sink.report_missed(trigger, &missed),
                None => tracing::warn!(
                    trigger_id = %id,
                    missed = missed.len(),
                    "trigger missed fire times, no recovery configured"
                ),
            }
        }

        if trigger.status() == TriggerStatus::Expired && trigger.source() == self.owned_source {
            trigger.stop_checkers();
            if let Err(e) = self.loader.remove(id) {
                tracing::error!(trigger_id = %id, error = %e, "failed to remove expired trigger");
            }
            tracing::info!(trigger_id = %id, "expired trigger removed");
            report.removed += 1;
            false
        } else {
            trigger.update_next_check_time();
            true
        }
    }

    async fn transition(&self, trigger: &mut Trigger) -> Result<Transition, TriggerManagerError> {
        if trigger.status() != TriggerStatus::Ready {
            return Ok(Transition::Inactive);
        }

        if trigger.has_end_time_expiry() && trigger.expire_condition_met()? {
            run_actions(trigger, trigger.expire_actions(), "expire").await;
            trigger.set_status(TriggerStatus::Paused);
            self.loader.update(trigger)?;
            tracing::info!(trigger_id = %trigger.id(), "trigger passed its end time, paused");
            return Ok(Transition::Paused);
        }

        if trigger.trigger_condition_met()? {
            run_actions(trigger, trigger.actions(), "trigger").await;
            let transition = if trigger.reset_on_trigger() {
                trigger.reset_trigger_condition();
                trigger.reset_expire_condition();
                Transition::Fired
            } else {
                trigger.set_status(TriggerStatus::Expired);
                Transition::Expired
            };
            self.loader.update(trigger)?;
            return Ok(transition);
        }

        Ok(Transition::Waiting)
    }
}

/// Run each action; a failure is logged and the rest still run.
async fn run_actions(trigger: &Trigger, actions: &[Arc<dyn TriggerAction>], kind: &str) {
    for action in actions {
        tracing::debug!(trigger_id = %trigger.id(), action = %action.id(), kind, "doing action");
        if let Err(e) = action.do_action().await {
            tracing::error!(
                trigger_id = %trigger.id(),
                action = %action.description(),
                kind,
                error = %e,
                "failed to do action"
            );
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

#[cfg(test)]
#[path = "scan_tests.rs"]
mod tests;
