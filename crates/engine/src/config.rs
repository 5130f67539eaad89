// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine configuration, read from `cadence.toml`.

use crate::env::EnvOverrides;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Source tag of triggers created by the schedule adapter.
pub const SIMPLE_TIME_TRIGGER_SOURCE: &str = "SimpleTimeTrigger";

pub const DEFAULT_SCAN_INTERVAL_MS: u64 = 60_000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub scanner: ScannerConfig,
    pub missed_schedule: MissedScheduleConfig,
    pub executor: ExecutorConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    pub scan_interval_ms: u64,
    /// Expired triggers carrying this source are deleted by the scanner.
    pub owned_source: String,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            scan_interval_ms: DEFAULT_SCAN_INTERVAL_MS,
            owned_source: SIMPLE_TIME_TRIGGER_SOURCE.to_string(),
        }
    }
}

impl ScannerConfig {
    pub fn scan_interval(&self) -> Duration {
        Duration::from_millis(self.scan_interval_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MissedScheduleConfig {
    pub enabled: bool,
    /// Worker count; zero or less disables the manager.
    pub thread_pool_size: i64,
    pub idle_interval_ms: u64,
    pub shutdown_grace_ms: u64,
    /// Notified when a flow's execution options name no failure emails.
    pub default_recipients: Vec<String>,
}

impl Default for MissedScheduleConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            thread_pool_size: 50,
            idle_interval_ms: 60_000,
            shutdown_grace_ms: 5_000,
            default_recipients: Vec::new(),
        }
    }
}

impl MissedScheduleConfig {
    pub fn idle_interval(&self) -> Duration {
        Duration::from_millis(self.idle_interval_ms)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}

/// External command that starts flows. Empty means log only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    pub command: Vec<String>,
    pub timeout_secs: u64,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            command: Vec::new(),
            timeout_secs: 60,
        }
    }
}

impl ExecutorConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl EngineConfig {
    /// Load from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.display().to_string(),
                    source,
                })
            }
        };
        let config: Self = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides on top of file values.
    pub fn apply(&mut self, overrides: &EnvOverrides) -> Result<(), ConfigError> {
        if let Some(ms) = overrides.scan_interval_ms {
            self.scanner.scan_interval_ms = ms;
        }
        if let Some(enabled) = overrides.missed_schedule_enabled {
            self.missed_schedule.enabled = enabled;
        }
        if let Some(threads) = overrides.missed_schedule_threads {
            self.missed_schedule.thread_pool_size = threads;
        }
        if let Some(ms) = overrides.missed_schedule_idle_ms {
            self.missed_schedule.idle_interval_ms = ms;
        }
        self.validate()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scanner.scan_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "scanner.scan_interval_ms must be positive".to_string(),
            ));
        }
        if self.scanner.owned_source.is_empty() {
            return Err(ConfigError::Invalid(
                "scanner.owned_source must not be empty".to_string(),
            ));
        }
        if self.missed_schedule.idle_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "missed_schedule.idle_interval_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
