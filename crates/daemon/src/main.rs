// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cadence Daemon (cadenced)
//!
//! Background process that owns the trigger scanner and the missed-schedule
//! recovery pool.
//!
//! Architecture:
//! - Scanner Task: sweeps the live trigger set once per scan interval
//! - Recovery Workers: notify owners of missed runs and start catch-up runs
//! - Main Task: waits for a termination signal, then shuts both down

use cadence_daemon::lifecycle::{self, Config, LifecycleError};
use cadence_daemon::logging::{
    rotate_log_if_needed, setup_logging, write_startup_error, write_startup_marker,
};
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Handle info flags before any config/lock acquisition
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "--version" | "-V" | "-v" => {
                println!("cadenced {VERSION}");
                return Ok(());
            }
            "--help" | "-h" | "help" => {
                println!("cadenced {VERSION}");
                println!("Cadence Daemon - runs scheduled flows from stored triggers");
                println!();
                println!("USAGE:");
                println!("    cadenced");
                println!();
                println!("State lives in $CADENCE_STATE_DIR, $XDG_STATE_HOME/cadence or");
                println!("~/.local/state/cadence. Engine settings are read from cadence.toml");
                println!("and declared schedules from schedules.toml in that directory.");
                println!();
                println!("OPTIONS:");
                println!("    -h, --help       Print help information");
                println!("    -v, --version    Print version information");
                return Ok(());
            }
            _ => {
                eprintln!("error: unexpected argument '{arg}'");
                eprintln!("Usage: cadenced [--help | --version]");
                std::process::exit(1);
            }
        }
    }

    let config = Config::load()?;

    rotate_log_if_needed(&config.log_path);
    write_startup_marker(&config.log_path)?;
    let log_guard = setup_logging(&config.log_path)?;

    info!(version = VERSION, "starting daemon");

    let daemon = match lifecycle::startup(&config).await {
        Ok(daemon) => daemon,
        Err(LifecycleError::LockFailed(_)) => {
            let pid = std::fs::read_to_string(&config.lock_path)
                .unwrap_or_default()
                .trim()
                .to_string();
            eprintln!("cadenced is already running");
            if !pid.is_empty() {
                eprintln!("  pid: {pid}");
            }
            std::process::exit(1);
        }
        Err(e) => {
            write_startup_error(&config.log_path, &e);
            error!(error = %e, "failed to start daemon");
            drop(log_guard);
            return Err(e.into());
        }
    };

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    info!(
        scan_interval_ms = daemon.engine.scanner.scan_interval_ms,
        missed_schedule_recovery = daemon.missed.is_enabled(),
        "daemon ready"
    );
    println!("READY");

    tokio::select! {
        _ = sigterm.recv() => info!("received SIGTERM, shutting down"),
        _ = sigint.recv() => info!("received SIGINT, shutting down"),
    }

    daemon.shutdown().await;
    info!("daemon stopped");
    Ok(())
}
