// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Trigger manager: owns the live trigger set and the background scanner.
//!
//! The scanner and every mutation share one lock over the set, so a caller
//! never sees a half-swept set. Mutations do not wake the scanner: a trigger
//! inserted with an already-met condition fires on the next scheduled
//! cycle, up to one scan interval later.

use crate::config::ScannerConfig;
use crate::error::TriggerManagerError;
use crate::scan::{ScanReport, Sweep};
use crate::trigger_set::TriggerSet;
use cadence_core::{format_epoch_ms, SharedClock, Trigger, TriggerId, TriggerStatus};
use cadence_storage::TriggerLoader;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Notify};
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Receives fire times a trigger stepped over without firing.
pub trait MissedScheduleSink: Send + Sync {
    fn report_missed(&self, trigger: &Trigger, missed: &[i64]);
}

/// Scanner bookkeeping exposed for status pages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScannerStats {
    pub cycles: u64,
    pub last_cycle_start_ms: i64,
    pub last_cycle_duration_ms: u64,
    /// Time the scanner slept after the last cycle; negative when it fell
    /// behind.
    pub idle_ms: i64,
    pub stage: String,
    pub trigger_count: usize,
    pub sources: BTreeSet<String>,
    pub last_report: ScanReport,
}

#[derive(Clone)]
pub struct TriggerManager {
    inner: Arc<Inner>,
}

struct Inner {
    triggers: Mutex<TriggerSet>,
    loader: TriggerLoader,
    clock: SharedClock,
    scan_interval: Duration,
    owned_source: String,
    missed_sink: Option<Arc<dyn MissedScheduleSink>>,
    shutdown: AtomicBool,
    wake: Notify,
    stats: parking_lot::Mutex<ScannerStats>,
    stage: parking_lot::Mutex<String>,
    scanner: parking_lot::Mutex<Option<JoinHandle<()>>>,
}

impl TriggerManager {
    pub fn new(
        loader: TriggerLoader,
        clock: SharedClock,
        config: &ScannerConfig,
        missed_sink: Option<Arc<dyn MissedScheduleSink>>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                triggers: Mutex::new(TriggerSet::new()),
                loader,
                clock,
                scan_interval: config.scan_interval(),
                owned_source: config.owned_source.clone(),
                missed_sink,
                shutdown: AtomicBool::new(false),
                wake: Notify::new(),
                stats: parking_lot::Mutex::new(ScannerStats::default()),
                stage: parking_lot::Mutex::new(String::new()),
                scanner: parking_lot::Mutex::new(None),
            }),
        }
    }

    pub fn owned_source(&self) -> &str {
        &self.inner.owned_source
    }

    pub fn clock(&self) -> &SharedClock {
        &self.inner.clock
    }

    /// Load every stored trigger and start the scanner.
    pub async fn start(&self) -> Result<(), TriggerManagerError> {
        if self.inner.scanner.lock().is_some() {
            return Err(TriggerManagerError::AlreadyStarted);
        }
        let loaded = self.inner.loader.load_all()?;
        let count = {
            let mut set = self.inner.triggers.lock().await;
            for mut trigger in loaded {
                trigger.update_next_check_time();
                set.insert(trigger);
            }
            set.len()
        };
        tracing::info!(
            triggers = count,
            interval_ms = self.inner.scan_interval.as_millis() as u64,
            "trigger manager loaded"
        );

        let inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(async move { inner.run_scanner().await });
        *self.inner.scanner.lock() = Some(handle);
        Ok(())
    }

    /// Stop the scanner and wait for the current cycle to finish.
    pub async fn shutdown(&self) {
        tracing::info!("shutting down trigger scanner");
        self.inner.shutdown.store(true, Ordering::SeqCst);
        self.inner.wake.notify_one();
        let handle = self.inner.scanner.lock().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "trigger scanner task failed");
            }
        }
    }

    /// Run one sweep now, outside the scanner's schedule.
    pub async fn scan_once(&self) -> ScanReport {
        self.inner.scan_cycle().await
    }

    /// Persist a new trigger, then add it to the live set.
    pub async fn insert_trigger(&self, mut trigger: Trigger) -> Result<TriggerId, TriggerManagerError> {
        let mut set = self.inner.triggers.lock().await;
        let id = self.inner.loader.insert(&mut trigger)?;
        trigger.update_next_check_time();
        set.insert(trigger);
        tracing::info!(trigger_id = %id, "trigger inserted");
        Ok(id)
    }

    /// Persist a changed trigger, then replace the live copy.
    pub async fn update_trigger(&self, mut trigger: Trigger) -> Result<(), TriggerManagerError> {
        let id = trigger.id();
        if !id.is_assigned() {
            return Err(TriggerManagerError::Unassigned);
        }
        let mut set = self.inner.triggers.lock().await;
        if !set.contains(id) {
            return Err(TriggerManagerError::NotFound(id));
        }
        self.inner.loader.update(&mut trigger)?;
        trigger.update_next_check_time();
        set.insert(trigger);
        tracing::info!(trigger_id = %id, "trigger updated");
        Ok(())
    }

    /// Drop a trigger from the live set, then from persistence.
    ///
    /// A failed delete leaves the stored record behind; the error is
    /// logged and returned.
    pub async fn remove_trigger(&self, id: TriggerId) -> Result<(), TriggerManagerError> {
        let mut set = self.inner.triggers.lock().await;
        let mut trigger = set.remove(id).ok_or(TriggerManagerError::NotFound(id))?;
        trigger.stop_checkers();
        if let Err(e) = self.inner.loader.remove(id) {
            tracing::error!(trigger_id = %id, error = %e, "failed to delete stored trigger");
            return Err(e.into());
        }
        tracing::info!(trigger_id = %id, "trigger removed");
        Ok(())
    }

    pub async fn get_trigger(&self, id: TriggerId) -> Option<Trigger> {
        self.inner.triggers.lock().await.get(id).cloned()
    }

    /// Every live trigger, by id.
    pub async fn get_triggers(&self) -> Vec<Trigger> {
        self.collect(|_| true).await
    }

    pub async fn get_triggers_by_source(&self, source: &str) -> Vec<Trigger> {
        self.collect(|t| t.source() == source).await
    }

    /// Triggers from `source` modified after `since`.
    pub async fn get_trigger_updates(&self, source: &str, since: i64) -> Vec<Trigger> {
        self.collect(|t| t.source() == source && t.last_modify_time() > since)
            .await
    }

    /// Triggers from any source modified after `since`.
    pub async fn get_all_trigger_updates(&self, since: i64) -> Vec<Trigger> {
        self.collect(|t| t.last_modify_time() > since).await
    }

    /// The trigger, if it was modified after `since`.
    pub async fn get_updated_trigger_by_id(&self, id: TriggerId, since: i64) -> Option<Trigger> {
        self.inner
            .triggers
            .lock()
            .await
            .get(id)
            .filter(|t| t.last_modify_time() > since)
            .cloned()
    }

    /// Replace the live copy with the stored one.
    pub async fn reload_trigger(&self, id: TriggerId) -> Result<(), TriggerManagerError> {
        let mut set = self.inner.triggers.lock().await;
        let mut trigger = self
            .inner
            .loader
            .load(id)?
            .ok_or(TriggerManagerError::NotFound(id))?;
        trigger.update_next_check_time();
        set.insert(trigger);
        Ok(())
    }

    pub async fn pause_trigger(&self, id: TriggerId) -> Result<(), TriggerManagerError> {
        self.modify(id, |trigger| trigger.set_status(TriggerStatus::Paused))
            .await
    }

    /// Return a paused trigger to READY with both conditions rearmed.
    pub async fn resume_trigger(&self, id: TriggerId) -> Result<(), TriggerManagerError> {
        self.modify(id, |trigger| {
            trigger.set_status(TriggerStatus::Ready);
            trigger.reset_trigger_condition();
            trigger.reset_expire_condition();
        })
        .await
    }

    /// Pull in triggers written by other instances since `since`.
    ///
    /// Returns the number of triggers added or replaced.
    pub async fn sync_from_store(&self, since: i64) -> Result<usize, TriggerManagerError> {
        let updates = self.inner.loader.load_since(since)?;
        let mut set = self.inner.triggers.lock().await;
        let count = updates.len();
        for mut trigger in updates {
            trigger.update_next_check_time();
            set.insert(trigger);
        }
        if count > 0 {
            tracing::info!(count, since = %format_epoch_ms(since), "synced triggers from store");
        }
        Ok(count)
    }

    pub fn stats(&self) -> ScannerStats {
        let mut stats = self.inner.stats.lock().clone();
        stats.stage = self.inner.stage.lock().clone();
        stats
    }

    async fn collect(&self, keep: impl Fn(&Trigger) -> bool) -> Vec<Trigger> {
        let set = self.inner.triggers.lock().await;
        let mut triggers: Vec<Trigger> = set.iter().filter(|t| keep(t)).cloned().collect();
        triggers.sort_by_key(|t| t.id());
        triggers
    }

    /// Apply `change` to a copy of the trigger, persist it, then swap it in.
    async fn modify(
        &self,
        id: TriggerId,
        change: impl FnOnce(&mut Trigger),
    ) -> Result<(), TriggerManagerError> {
        let mut set = self.inner.triggers.lock().await;
        let mut trigger = set
            .get(id)
            .cloned()
            .ok_or(TriggerManagerError::NotFound(id))?;
        change(&mut trigger);
        self.inner.loader.update(&mut trigger)?;
        trigger.update_next_check_time();
        tracing::info!(trigger_id = %id, status = %trigger.status(), "trigger status changed");
        set.insert(trigger);
        Ok(())
    }
}

impl Inner {
    async fn run_scanner(self: Arc<Self>) {
        tracing::info!("trigger scanner started");
        while !self.shutdown.load(Ordering::SeqCst) {
            let started = Instant::now();
            self.scan_cycle().await;
            let elapsed = started.elapsed();

            let idle_ms = self.scan_interval.as_millis() as i64 - elapsed.as_millis() as i64;
            self.stats.lock().idle_ms = idle_ms;
            let Some(idle) = self.scan_interval.checked_sub(elapsed) else {
                tracing::warn!(
                    elapsed_ms = elapsed.as_millis() as u64,
                    interval_ms = self.scan_interval.as_millis() as u64,
                    "trigger scanner is falling behind"
                );
                continue;
            };
            tokio::select! {
                _ = tokio::time::sleep(idle) => {}
                _ = self.wake.notified() => {
                    tracing::debug!("trigger scanner woken");
                }
            }
        }
        tracing::info!("trigger scanner stopped");
    }

    async fn scan_cycle(&self) -> ScanReport {
        let start_ms = self.clock.epoch_ms();
        let started = Instant::now();
        *self.stage.lock() = format!(
            "Ready to start a new scan cycle at {}",
            format_epoch_ms(start_ms)
        );

        let mut set = self.triggers.lock().await;
        let sweep = Sweep {
            loader: &self.loader,
            owned_source: &self.owned_source,
            missed_sink: self.missed_sink.as_ref(),
            stage: &self.stage,
        };
        let report = sweep.run(&mut set).await;

        let sources: BTreeSet<String> = set.iter().map(|t| t.source().to_string()).collect();
        let trigger_count = set.len();
        drop(set);

        *self.stage.lock() = "Done flipping all triggers.".to_string();
        let mut stats = self.stats.lock();
        stats.cycles += 1;
        stats.last_cycle_start_ms = start_ms;
        stats.last_cycle_duration_ms = started.elapsed().as_millis() as u64;
        stats.trigger_count = trigger_count;
        stats.sources = sources;
        stats.last_report = report;
        if report.fired + report.paused + report.failed > 0 {
            tracing::info!(
                checked = report.checked,
                fired = report.fired,
                paused = report.paused,
                expired = report.expired,
                removed = report.removed,
                failed = report.failed,
                "scan cycle complete"
            );
        }
        report
    }
}

#[cfg(test)]
#[path = "trigger_manager_tests.rs"]
mod tests;
