// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: startup and shutdown.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use cadence_adapters::{
    CommandFlowExecutor, DesktopNotifyAdapter, FlowExecutor, NoOpFlowExecutor, NotifyAdapter,
    TracedExecutor, TracedNotify,
};
use cadence_core::{Registries, SharedClock, SystemClock};
use cadence_engine::{
    register_builtin_types, ConfigError, EngineConfig, EnvOverrides, ExecutorConfig,
    MissedScheduleSink, MissedSchedulesManager, ScheduleManager, TriggerBasedScheduleLoader,
    TriggerManager, TriggerManagerError,
};
use cadence_storage::{FsTriggerStore, StoreError, TriggerLoader};
use fs2::FileExt;
use thiserror::Error;
use tracing::{info, warn};

use crate::env::state_dir;
use crate::schedules_file::{self, ScheduleEntry, SchedulesFileError};

/// Notifier used by the daemon binary.
pub type DaemonNotifier = TracedNotify<DesktopNotifyAdapter>;

/// Daemon paths
#[derive(Debug, Clone)]
pub struct Config {
    /// Root state directory (e.g. ~/.local/state/cadence)
    pub state_dir: PathBuf,
    /// Lock/PID file
    pub lock_path: PathBuf,
    pub log_path: PathBuf,
    /// Engine settings (`cadence.toml`)
    pub config_path: PathBuf,
    /// Declarative schedules (`schedules.toml`)
    pub schedules_path: PathBuf,
    /// One record file per trigger
    pub triggers_path: PathBuf,
}

impl Config {
    /// Paths under the resolved state directory.
    pub fn load() -> Result<Self, LifecycleError> {
        Ok(Self::in_dir(state_dir()?))
    }

    pub fn in_dir(state_dir: impl Into<PathBuf>) -> Self {
        let state_dir = state_dir.into();
        Self {
            lock_path: state_dir.join("cadenced.pid"),
            log_path: state_dir.join("cadenced.log"),
            config_path: state_dir.join("cadence.toml"),
            schedules_path: state_dir.join("schedules.toml"),
            triggers_path: state_dir.join("triggers"),
            state_dir,
        }
    }
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("could not determine state directory")]
    NoStateDir,

    #[error("failed to acquire lock: daemon already running?")]
    LockFailed(#[source] std::io::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("trigger store error: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    Triggers(#[from] TriggerManagerError),

    #[error(transparent)]
    Schedules(#[from] SchedulesFileError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// External side effects handed to the engine.
pub struct Adapters<N> {
    pub executor: Arc<dyn FlowExecutor>,
    pub notifier: N,
}

/// A running daemon.
pub struct Daemon<N: NotifyAdapter> {
    pub config: Config,
    // NOTE(lifetime): Held to maintain exclusive file lock; released on drop
    #[allow(dead_code)]
    lock_file: File,
    pub engine: EngineConfig,
    pub triggers: TriggerManager,
    pub schedules: Arc<ScheduleManager>,
    pub missed: MissedSchedulesManager<N>,
    pub start_time: Instant,
}

impl<N: NotifyAdapter> Daemon<N> {
    /// Stop the scanner first so it cannot queue new recovery work, then
    /// drain the recovery pool.
    pub async fn shutdown(self) {
        info!("shutting down daemon");
        self.triggers.shutdown().await;
        self.missed.shutdown().await;

        if let Err(e) = std::fs::remove_file(&self.config.lock_path) {
            warn!(error = %e, "failed to remove PID file");
        }
        info!(
            uptime_secs = self.start_time.elapsed().as_secs(),
            "daemon shutdown complete"
        );
    }
}

/// Executor for the configured command, or a logging no-op.
pub fn flow_executor(config: &ExecutorConfig) -> Arc<dyn FlowExecutor> {
    match config.command.split_first() {
        Some((program, args)) => Arc::new(TracedExecutor::new(CommandFlowExecutor::new(
            program,
            args.to_vec(),
            config.timeout(),
        ))),
        None => {
            info!("no executor command configured; flow executions are only logged");
            Arc::new(TracedExecutor::new(NoOpFlowExecutor::new()))
        }
    }
}

/// Start the daemon with the production adapters.
pub async fn startup(config: &Config) -> Result<Daemon<DaemonNotifier>, LifecycleError> {
    startup_with(config, |engine| Adapters {
        executor: flow_executor(&engine.executor),
        notifier: TracedNotify::new(DesktopNotifyAdapter::new()),
    })
    .await
}

/// Start the daemon with adapters built from the loaded engine config.
pub async fn startup_with<N, F>(config: &Config, adapters: F) -> Result<Daemon<N>, LifecycleError>
where
    N: NotifyAdapter,
    F: FnOnce(&EngineConfig) -> Adapters<N>,
{
    match startup_inner(config, adapters).await {
        Ok(daemon) => Ok(daemon),
        Err(e) => {
            // The lock file belongs to the running daemon.
            if !matches!(e, LifecycleError::LockFailed(_)) {
                let _ = std::fs::remove_file(&config.lock_path);
            }
            Err(e)
        }
    }
}

async fn startup_inner<N, F>(config: &Config, adapters: F) -> Result<Daemon<N>, LifecycleError>
where
    N: NotifyAdapter,
    F: FnOnce(&EngineConfig) -> Adapters<N>,
{
    // 1. Acquire lock file first
    std::fs::create_dir_all(&config.state_dir)?;
    let lock_file = acquire_lock(&config.lock_path)?;

    // 2. Everything that can be rejected is read before anything starts
    let mut engine = EngineConfig::load(&config.config_path)?;
    engine.apply(&EnvOverrides::from_env())?;
    let entries = schedules_file::load(&config.schedules_path)?;
    let store = FsTriggerStore::open(&config.triggers_path)?;

    // 3. Wire adapters, registries and the clock
    let Adapters { executor, notifier } = adapters(&engine);
    let clock: SharedClock = Arc::new(SystemClock);
    let registries = Registries::new();
    register_builtin_types(&registries, Arc::clone(&clock), Arc::clone(&executor));
    let loader = TriggerLoader::new(Arc::new(store), Arc::new(registries), Arc::clone(&clock));

    // 4. Recovery pool, then the scanner that feeds it
    let missed = MissedSchedulesManager::new(&engine.missed_schedule, notifier);
    missed.start();
    let sink: Arc<dyn MissedScheduleSink> = Arc::new(missed.clone());
    let triggers = TriggerManager::new(loader, Arc::clone(&clock), &engine.scanner, Some(sink));
    triggers.start().await?;

    // 5. Schedules
    let schedules = Arc::new(ScheduleManager::new(
        TriggerBasedScheduleLoader::new(triggers.clone(), executor),
        clock,
    ));
    schedules.load().await;
    apply_schedule_entries(&schedules, &entries).await;

    info!(state_dir = %config.state_dir.display(), "daemon started");

    Ok(Daemon {
        config: config.clone(),
        lock_file,
        engine,
        triggers,
        schedules,
        missed,
        start_time: Instant::now(),
    })
}

fn acquire_lock(path: &Path) -> Result<File, LifecycleError> {
    // Don't truncate before holding the lock; that would wipe the running
    // daemon's PID.
    let mut lock_file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)?;
    lock_file
        .try_lock_exclusive()
        .map_err(LifecycleError::LockFailed)?;
    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;
    Ok(lock_file)
}

/// Schedule each declared flow. Bad entries are logged and skipped.
///
/// Returns the number of entries applied.
pub async fn apply_schedule_entries(schedules: &ScheduleManager, entries: &[ScheduleEntry]) -> usize {
    let mut applied = 0;
    for entry in entries {
        let result = match entry.to_schedule() {
            Ok(schedule) => schedules.schedule_flow(schedule).await.map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };
        match result {
            Ok(schedule) => {
                info!(
                    schedule_id = %schedule.schedule_id,
                    project = %entry.project,
                    flow = %entry.flow,
                    "declared schedule applied"
                );
                applied += 1;
            }
            Err(error) => warn!(project = %entry.project, flow = %entry.flow, %error, "skipping declared schedule"),
        }
    }
    applied
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
