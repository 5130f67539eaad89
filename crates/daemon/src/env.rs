// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Environment variable access for the daemon crate.

use std::path::PathBuf;

use crate::lifecycle::LifecycleError;

pub const STATE_DIR: &str = "CADENCE_STATE_DIR";

/// Resolve state directory: CADENCE_STATE_DIR > XDG_STATE_HOME/cadence > ~/.local/state/cadence
pub fn state_dir() -> Result<PathBuf, LifecycleError> {
    state_dir_from(|name| std::env::var(name).ok())
}

fn state_dir_from(lookup: impl Fn(&str) -> Option<String>) -> Result<PathBuf, LifecycleError> {
    if let Some(dir) = lookup(STATE_DIR) {
        return Ok(PathBuf::from(dir));
    }
    if let Some(xdg) = lookup("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("cadence"));
    }
    let home = lookup("HOME").ok_or(LifecycleError::NoStateDir)?;
    Ok(PathBuf::from(home).join(".local/state/cadence"))
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
