// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use cadence_adapters::{FakeFlowExecutor, FakeNotifyAdapter, FlowExecutionRequest};
use cadence_core::ExecutionOptions;
use tempfile::tempdir;

const SCHEDULES: &str = r#"
[[schedule]]
project_id = 7
project = "etl"
flow = "hourly"
user = "alice"
first_time = "2026-01-01T00:00:00Z"
period = "1h"

[[schedule]]
project_id = 7
project = "etl"
flow = "long-gone"
user = "alice"
first_time = "2020-01-01T00:00:00Z"
"#;

fn fakes(_: &EngineConfig) -> Adapters<FakeNotifyAdapter> {
    Adapters {
        executor: Arc::new(FakeFlowExecutor::new()),
        notifier: FakeNotifyAdapter::new(),
    }
}

#[test]
fn paths_live_under_the_state_dir() {
    let config = Config::in_dir("/srv/cadence");
    assert_eq!(config.lock_path, PathBuf::from("/srv/cadence/cadenced.pid"));
    assert_eq!(config.config_path, PathBuf::from("/srv/cadence/cadence.toml"));
    assert_eq!(config.schedules_path, PathBuf::from("/srv/cadence/schedules.toml"));
    assert_eq!(config.triggers_path, PathBuf::from("/srv/cadence/triggers"));
}

#[tokio::test]
async fn startup_applies_declared_schedules() {
    let dir = tempdir().unwrap();
    let config = Config::in_dir(dir.path());
    std::fs::create_dir_all(dir.path()).unwrap();
    std::fs::write(&config.schedules_path, SCHEDULES).unwrap();

    let daemon = startup_with(&config, fakes).await.unwrap();

    let schedules = daemon.schedules.get_schedules().await;
    assert_eq!(schedules.len(), 1);
    assert_eq!(schedules[0].flow_id, "hourly");
    assert_eq!(daemon.triggers.get_triggers().await.len(), 1);
    let pid = std::fs::read_to_string(&config.lock_path).unwrap();
    assert_eq!(pid.trim(), std::process::id().to_string());

    daemon.shutdown().await;
    assert!(!config.lock_path.exists());
}

#[tokio::test]
async fn second_daemon_is_locked_out() {
    let dir = tempdir().unwrap();
    let config = Config::in_dir(dir.path());
    let first = startup_with(&config, fakes).await.unwrap();

    let Err(err) = startup_with(&config, fakes).await else {
        panic!("second startup should fail");
    };
    assert!(matches!(err, LifecycleError::LockFailed(_)));
    // The running daemon keeps its PID file.
    assert!(config.lock_path.exists());

    first.shutdown().await;
}

#[tokio::test]
async fn schedules_survive_a_restart() {
    let dir = tempdir().unwrap();
    let config = Config::in_dir(dir.path());
    std::fs::create_dir_all(dir.path()).unwrap();
    std::fs::write(&config.schedules_path, SCHEDULES).unwrap();
    let first = startup_with(&config, fakes).await.unwrap();
    let id = first.schedules.get_schedules().await[0].schedule_id;
    first.shutdown().await;

    std::fs::remove_file(&config.schedules_path).unwrap();
    let second = startup_with(&config, fakes).await.unwrap();
    let schedules = second.schedules.get_schedules().await;
    assert_eq!(schedules.len(), 1);
    assert_eq!(schedules[0].schedule_id, id);
    second.shutdown().await;
}

#[tokio::test]
async fn invalid_config_fails_startup_and_releases_lock() {
    let dir = tempdir().unwrap();
    let config = Config::in_dir(dir.path());
    std::fs::create_dir_all(dir.path()).unwrap();
    std::fs::write(&config.config_path, "[scanner]\nscan_interval_ms = 0\n").unwrap();

    let Err(err) = startup_with(&config, fakes).await else {
        panic!("startup should reject the config");
    };
    assert!(matches!(err, LifecycleError::Config(_)));
    assert!(!config.lock_path.exists());
}

#[tokio::test]
async fn unconfigured_executor_accepts_every_flow() {
    let executor = flow_executor(&ExecutorConfig::default());
    let request = FlowExecutionRequest {
        project_id: 1,
        project_name: "p".to_string(),
        flow_id: "f".to_string(),
        submit_user: "u".to_string(),
        options: ExecutionOptions::default(),
    };
    assert!(executor.execute_flow(&request).await.is_ok());
}
