// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon help and version specs
//!
//! Verify cadenced --help, --version, and related flags work without
//! acquiring the daemon lock (no startup attempt).

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use assert_cmd::Command;

fn cadenced() -> Command {
    Command::cargo_bin("cadenced").unwrap()
}

#[test]
fn version_flags_print_version() {
    for flag in ["--version", "-v", "-V"] {
        let output = cadenced().arg(flag).output().unwrap();
        assert!(output.status.success(), "{flag} failed");
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert_eq!(stdout.trim(), format!("cadenced {}", env!("CARGO_PKG_VERSION")));
    }
}

#[test]
fn help_describes_usage() {
    let output = cadenced().arg("--help").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("USAGE:"));
    assert!(stdout.contains("schedules.toml"));
}

#[test]
fn unknown_argument_fails() {
    let dir = tempfile::tempdir().unwrap();
    let output = cadenced()
        .arg("--bogus")
        .env("CADENCE_STATE_DIR", dir.path())
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unexpected argument '--bogus'"));
    // No startup was attempted.
    assert!(!dir.path().join("cadenced.pid").exists());
}
