// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the engine crate.

pub const SCAN_INTERVAL_MS: &str = "CADENCE_SCAN_INTERVAL_MS";
pub const MISSED_SCHEDULE_ENABLED: &str = "CADENCE_MISSED_SCHEDULE_ENABLED";
pub const MISSED_SCHEDULE_THREADS: &str = "CADENCE_MISSED_SCHEDULE_THREADS";
pub const MISSED_SCHEDULE_IDLE_MS: &str = "CADENCE_MISSED_SCHEDULE_IDLE_MS";

/// Config values taken from the environment. Unparseable values are
/// ignored with a warning.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvOverrides {
    pub scan_interval_ms: Option<u64>,
    pub missed_schedule_enabled: Option<bool>,
    pub missed_schedule_threads: Option<i64>,
    pub missed_schedule_idle_ms: Option<u64>,
}

impl EnvOverrides {
    /// Read overrides from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            scan_interval_ms: parsed(&lookup, SCAN_INTERVAL_MS),
            missed_schedule_enabled: lookup(MISSED_SCHEDULE_ENABLED)
                .and_then(|v| parse_flag(MISSED_SCHEDULE_ENABLED, &v)),
            missed_schedule_threads: parsed(&lookup, MISSED_SCHEDULE_THREADS),
            missed_schedule_idle_ms: parsed(&lookup, MISSED_SCHEDULE_IDLE_MS),
        }
    }
}

fn parsed<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<T> {
    let raw = lookup(name)?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!(var = name, value = %raw, "ignoring unparseable environment override");
            None
        }
    }
}

fn parse_flag(name: &str, raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => {
            tracing::warn!(var = name, value = %raw, "ignoring unparseable environment override");
            None
        }
    }
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
