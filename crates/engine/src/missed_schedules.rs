// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Missed-schedule recovery.
//!
//! Fire times a schedule stepped over are queued as tasks and drained by a
//! fixed pool of workers. Each task notifies the flow's owners and, when
//! the schedule asked for it, starts one catch-up execution. Tasks live
//! only in memory; anything still queued at shutdown is dropped.

use crate::config::MissedScheduleConfig;
use crate::error::MissedScheduleError;
use crate::execute_flow::ExecuteFlowAction;
use crate::trigger_manager::MissedScheduleSink;
use cadence_adapters::NotifyAdapter;
use cadence_core::{format_epoch_ms, Trigger, TriggerAction};
use crossbeam_channel::{Receiver, Sender, TryRecvError};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

pub const MISSED_SCHEDULE_SUBJECT: &str = "Missed Schedule Notification";

/// One unit of recovery work.
#[derive(Debug, Clone)]
pub struct MissedScheduleTask {
    pub missed_times: Vec<i64>,
    pub recipients: Vec<String>,
    pub subject: String,
    pub body: String,
    /// Catch-up execution, present only when back execution is enabled.
    pub catch_up: Option<Arc<dyn TriggerAction>>,
}

impl MissedScheduleTask {
    pub fn new(
        missed_times: Vec<i64>,
        recipients: Vec<String>,
        action: &ExecuteFlowAction,
        back_execution: bool,
    ) -> Self {
        let body = render_message(action, &missed_times, back_execution);
        Self {
            missed_times,
            recipients,
            subject: MISSED_SCHEDULE_SUBJECT.to_string(),
            body,
            catch_up: back_execution.then(|| Arc::new(action.clone()) as Arc<dyn TriggerAction>),
        }
    }
}

fn render_message(action: &ExecuteFlowAction, missed_times: &[i64], back_execution: bool) -> String {
    let times: Vec<String> = missed_times.iter().map(|t| format_epoch_ms(*t)).collect();
    let mut message = format!(
        "This is an automated notice to flow owners that the flow {} in project {} has \
         scheduled the executions on {} but failed to trigger on time.",
        action.flow_id(),
        action.project_name(),
        times.join(",")
    );
    if back_execution {
        message.push_str(
            " Back execution will start soon as you enabled back execute once on miss for this schedule.",
        );
    }
    message
}

#[derive(Debug, Default)]
struct Counters {
    missed_schedules: AtomicU64,
    notifications: AtomicU64,
    back_exec_part: AtomicU64,
    non_back_exec_part: AtomicU64,
    back_executions: AtomicU64,
}

/// Counter snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MissedScheduleStats {
    /// Missed fire times received.
    pub missed_schedules: u64,
    /// Tasks queued with at least one recipient.
    pub notifications: u64,
    /// Missed fire times of schedules with back execution enabled.
    pub back_exec_part: u64,
    pub non_back_exec_part: u64,
    /// Tasks queued with a catch-up execution.
    pub back_executions: u64,
}

struct Queue {
    tx: Sender<MissedScheduleTask>,
    rx: Receiver<MissedScheduleTask>,
}

struct Inner<N> {
    notifier: N,
    queue: Option<Queue>,
    pool_size: usize,
    idle_interval: Duration,
    shutdown_grace: Duration,
    default_recipients: Vec<String>,
    shutdown: watch::Sender<bool>,
    counters: Counters,
    workers: parking_lot::Mutex<Vec<JoinHandle<()>>>,
}

#[derive(Clone)]
pub struct MissedSchedulesManager<N: NotifyAdapter> {
    inner: Arc<Inner<N>>,
}

impl<N: NotifyAdapter> MissedSchedulesManager<N> {
    /// A manager that is disabled, or enabled with no workers, has no
    /// queue and never starts a task.
    pub fn new(config: &MissedScheduleConfig, notifier: N) -> Self {
        let queue = match (config.enabled, config.thread_pool_size) {
            (false, _) => None,
            (true, size) if size <= 0 => {
                tracing::warn!(
                    thread_pool_size = size,
                    "missed-schedule manager enabled without workers, disabling"
                );
                None
            }
            (true, _) => {
                let (tx, rx) = crossbeam_channel::unbounded();
                Some(Queue { tx, rx })
            }
        };
        let (shutdown, _) = watch::channel(false);
        Self {
            inner: Arc::new(Inner {
                notifier,
                queue,
                pool_size: usize::try_from(config.thread_pool_size).unwrap_or(0),
                idle_interval: config.idle_interval(),
                shutdown_grace: config.shutdown_grace(),
                default_recipients: config.default_recipients.clone(),
                shutdown,
                counters: Counters::default(),
                workers: parking_lot::Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.queue.is_some()
    }

    /// Spawn the worker pool. No-op when disabled or already running.
    pub fn start(&self) {
        let Some(queue) = &self.inner.queue else {
            tracing::debug!("missed-schedule manager disabled, not starting workers");
            return;
        };
        let mut workers = self.inner.workers.lock();
        if !workers.is_empty() {
            return;
        }
        for index in 0..self.inner.pool_size {
            let inner = Arc::clone(&self.inner);
            let rx = queue.rx.clone();
            let shutdown = self.inner.shutdown.subscribe();
            workers.push(tokio::spawn(async move {
                inner.run_worker(index, rx, shutdown).await
            }));
        }
        tracing::info!(workers = self.inner.pool_size, "missed-schedule workers started");
    }

    /// Queue notification (and optionally a catch-up run) for fire times
    /// the flow missed. Returns `Ok` without doing anything when disabled.
    pub fn add_missed_schedule(
        &self,
        missed_times: Vec<i64>,
        action: &ExecuteFlowAction,
        back_execution: bool,
    ) -> Result<(), MissedScheduleError> {
        let Some(queue) = &self.inner.queue else {
            tracing::debug!("missed-schedule manager disabled, ignoring missed schedule");
            return Ok(());
        };
        if *self.inner.shutdown.borrow() {
            return Err(MissedScheduleError::ShutDown);
        }

        let count = missed_times.len() as u64;
        let recipients = action
            .options()
            .failure_recipients(&self.inner.default_recipients);
        tracing::info!(
            project = %action.project_name(),
            flow = %action.flow_id(),
            missed = count,
            back_execution,
            "received missed schedule"
        );
        let has_recipients = !recipients.is_empty();
        let task = MissedScheduleTask::new(missed_times, recipients, action, back_execution);
        queue
            .tx
            .send(task)
            .map_err(|_| MissedScheduleError::ShutDown)?;

        let counters = &self.inner.counters;
        counters.missed_schedules.fetch_add(count, Ordering::Relaxed);
        if has_recipients {
            counters.notifications.fetch_add(1, Ordering::Relaxed);
        }
        if back_execution {
            counters.back_executions.fetch_add(1, Ordering::Relaxed);
            counters.back_exec_part.fetch_add(count, Ordering::Relaxed);
        } else {
            counters.non_back_exec_part.fetch_add(count, Ordering::Relaxed);
        }
        Ok(())
    }

    pub fn stats(&self) -> MissedScheduleStats {
        let c = &self.inner.counters;
        MissedScheduleStats {
            missed_schedules: c.missed_schedules.load(Ordering::Relaxed),
            notifications: c.notifications.load(Ordering::Relaxed),
            back_exec_part: c.back_exec_part.load(Ordering::Relaxed),
            non_back_exec_part: c.non_back_exec_part.load(Ordering::Relaxed),
            back_executions: c.back_executions.load(Ordering::Relaxed),
        }
    }

    /// Tasks waiting for a worker.
    pub fn pending(&self) -> usize {
        self.inner.queue.as_ref().map_or(0, |q| q.rx.len())
    }

    /// Stop the workers, waiting up to the grace period before aborting.
    pub async fn shutdown(&self) {
        if self.inner.shutdown.send_replace(true) {
            return;
        }
        let workers = std::mem::take(&mut *self.inner.workers.lock());
        if workers.is_empty() {
            return;
        }
        let dropped = self.pending();
        tracing::info!(workers = workers.len(), dropped, "shutting down missed-schedule workers");

        let aborts: Vec<_> = workers.iter().map(|h| h.abort_handle()).collect();
        let joined = tokio::time::timeout(self.inner.shutdown_grace, async move {
            for worker in workers {
                if let Err(e) = worker.await {
                    tracing::error!(error = %e, "missed-schedule worker failed");
                }
            }
        })
        .await;
        if joined.is_err() {
            tracing::warn!("missed-schedule workers did not stop in time, aborting");
            for abort in aborts {
                abort.abort();
            }
        }
    }
}

impl<N: NotifyAdapter> Inner<N> {
    async fn run_worker(
        &self,
        index: usize,
        rx: Receiver<MissedScheduleTask>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        tracing::debug!(worker = index, "missed-schedule worker started");
        loop {
            let stopping = *shutdown.borrow();
            if stopping {
                break;
            }
            match rx.try_recv() {
                Ok(task) => self.process(task).await,
                Err(TryRecvError::Empty) => {
                    tokio::select! {
                        _ = tokio::time::sleep(self.idle_interval) => {}
                        _ = shutdown.changed() => {}
                    }
                }
                Err(TryRecvError::Disconnected) => break,
            }
        }
        tracing::debug!(worker = index, "missed-schedule worker stopped");
    }

    /// Notify, then run the catch-up. Either step failing leaves the other
    /// unaffected.
    async fn process(&self, task: MissedScheduleTask) {
        if task.recipients.is_empty() {
            tracing::debug!("missed schedule has no recipients, not notifying");
        } else if let Err(e) = self
            .notifier
            .send(&task.recipients, &task.subject, &task.body)
            .await
        {
            tracing::error!(error = %e, "failed to send missed-schedule notification");
        }

        if let Some(action) = &task.catch_up {
            if let Err(e) = action.do_action().await {
                tracing::error!(
                    action = %action.description(),
                    error = %e,
                    "back execution failed"
                );
            }
        }
    }
}

impl<N: NotifyAdapter> MissedScheduleSink for MissedSchedulesManager<N> {
    fn report_missed(&self, trigger: &Trigger, missed: &[i64]) {
        let Some(action) = trigger.find_action::<ExecuteFlowAction>() else {
            tracing::warn!(
                trigger_id = %trigger.id(),
                missed = missed.len(),
                "trigger missed fire times but starts no flow"
            );
            return;
        };
        if let Err(e) =
            self.add_missed_schedule(missed.to_vec(), action, trigger.back_execute_once_on_miss())
        {
            tracing::warn!(trigger_id = %trigger.id(), error = %e, "failed to queue missed schedule");
        }
    }
}

#[cfg(test)]
#[path = "missed_schedules_tests.rs"]
mod tests;
