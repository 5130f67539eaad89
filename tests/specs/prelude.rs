//! Test helpers for behavioral specifications.
//!
//! Builds an engine the way the daemon does, with fakes at the edges.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, dead_code)]

use cadence_adapters::{FakeFlowExecutor, FakeNotifyAdapter};
use cadence_core::{Clock, FakeClock, Recurrence, Registries, Schedule};
use cadence_engine::{
    register_builtin_types, MissedScheduleConfig, MissedScheduleSink, MissedSchedulesManager,
    ScannerConfig, ScheduleManager, TriggerBasedScheduleLoader, TriggerManager,
};
use cadence_storage::{FsTriggerStore, TriggerLoader};
use std::path::Path;
use std::sync::Arc;

pub const HOUR_MS: i64 = 3_600_000;

/// One engine instance over a trigger directory.
pub struct Engine {
    pub triggers: TriggerManager,
    pub schedules: ScheduleManager,
    pub missed: MissedSchedulesManager<FakeNotifyAdapter>,
    pub executor: FakeFlowExecutor,
    pub notifier: FakeNotifyAdapter,
}

impl Engine {
    /// Wire an engine over `dir`. Nothing is started.
    pub fn open(dir: &Path, clock: &FakeClock, recovery: bool) -> Self {
        let executor = FakeFlowExecutor::new();
        let notifier = FakeNotifyAdapter::new();
        let registries = Registries::new();
        register_builtin_types(&registries, clock.shared(), Arc::new(executor.clone()));
        let store = FsTriggerStore::open(dir).unwrap();
        let loader = TriggerLoader::new(Arc::new(store), Arc::new(registries), clock.shared());

        let missed = MissedSchedulesManager::new(
            &MissedScheduleConfig {
                enabled: recovery,
                thread_pool_size: 2,
                idle_interval_ms: 50,
                shutdown_grace_ms: 1_000,
                default_recipients: vec!["owners@example.com".to_string()],
            },
            notifier.clone(),
        );
        let sink: Arc<dyn MissedScheduleSink> = Arc::new(missed.clone());
        let triggers = TriggerManager::new(
            loader,
            clock.shared(),
            &ScannerConfig {
                scan_interval_ms: 1_000,
                ..ScannerConfig::default()
            },
            Some(sink),
        );
        let schedules = ScheduleManager::new(
            TriggerBasedScheduleLoader::new(triggers.clone(), Arc::new(executor.clone())),
            clock.shared(),
        );
        Self {
            triggers,
            schedules,
            missed,
            executor,
            notifier,
        }
    }

    pub async fn stop(&self) {
        self.triggers.shutdown().await;
        self.missed.shutdown().await;
    }
}

/// An hourly schedule first due an hour from now.
pub fn hourly(clock: &FakeClock, flow: &str) -> Schedule {
    Schedule::new(
        42,
        "warehouse",
        flow,
        "alice",
        clock.epoch_ms() + HOUR_MS,
        chrono_tz::UTC,
        Recurrence::Period(cadence_core::Period::hours(1)),
    )
}
