// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon log file: rotation and tracing setup.

use std::io::Write;
use std::path::{Path, PathBuf};

use crate::lifecycle::LifecycleError;

/// Logs larger than this are rotated at startup.
pub const MAX_LOG_SIZE: u64 = 10 * 1024 * 1024;

/// Rotated copies kept next to the live log (`.1` is newest).
pub const MAX_ROTATIONS: u32 = 3;

/// Prefix of the line written before logging is set up.
/// Full format: "--- cadenced: starting (pid: 12345) ---"
pub const STARTUP_MARKER_PREFIX: &str = "--- cadenced: starting (pid: ";

fn rotated(log: &Path, n: u32) -> PathBuf {
    let mut name = log.as_os_str().to_os_string();
    name.push(format!(".{n}"));
    PathBuf::from(name)
}

/// Shift `log` to `log.1`, older rotations up by one, dropping the oldest.
pub fn rotate_log_if_needed(log: &Path) {
    let Ok(meta) = std::fs::metadata(log) else {
        return;
    };
    if meta.len() <= MAX_LOG_SIZE {
        return;
    }
    for n in (1..MAX_ROTATIONS).rev() {
        let from = rotated(log, n);
        if from.exists() {
            let _ = std::fs::rename(&from, rotated(log, n + 1));
        }
    }
    let _ = std::fs::rename(log, rotated(log, 1));
}

/// Append the startup marker so a reader can find where this run begins.
pub fn write_startup_marker(log: &Path) -> Result<(), LifecycleError> {
    if let Some(parent) = log.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log)?;
    writeln!(file, "{}{}) ---", STARTUP_MARKER_PREFIX, std::process::id())?;
    Ok(())
}

/// Write a startup failure synchronously; the non-blocking writer may not
/// flush before exit.
pub fn write_startup_error(log: &Path, error: &LifecycleError) {
    let Ok(mut file) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log)
    else {
        return;
    };
    let _ = writeln!(file, "ERROR failed to start daemon: {error}");
}

pub fn setup_logging(
    log: &Path,
) -> Result<tracing_appender::non_blocking::WorkerGuard, LifecycleError> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let dir = log.parent().ok_or(LifecycleError::NoStateDir)?;
    std::fs::create_dir_all(dir)?;
    let file_appender =
        tracing_appender::rolling::never(dir, log.file_name().ok_or(LifecycleError::NoStateDir)?);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    Ok(guard)
}

#[cfg(test)]
#[path = "logging_tests.rs"]
mod tests;
