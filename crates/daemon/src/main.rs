// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! warden daemon (wardend)
//!
//! One binary, started once per role by the host's process supervisor:
//!
//!     wardend guardian
//!     wardend dispatcher
//!     wardend scheduler
//!
//! The roles share one SQLite database (WAL), one status file, and one
//! tmux pane; a per-role lock file keeps each role single-instance.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use warden_daemon::config::Config;
use warden_daemon::lifecycle::{
    self, acquire_lock, rotate_log_if_needed, setup_logging, write_startup_marker, Role,
};
use warden_daemon::roles;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let role = match args.next().as_deref() {
        Some("--version") | Some("-V") | Some("-v") => {
            println!("wardend {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        Some("--help") | Some("-h") | Some("help") | None => {
            print_help();
            return Ok(());
        }
        Some(arg) => match Role::parse(arg) {
            Some(role) => role,
            None => {
                eprintln!("error: unknown role '{arg}'");
                eprintln!("Usage: wardend <guardian|dispatcher|scheduler>");
                std::process::exit(1);
            }
        },
    };
    if let Some(extra) = args.next() {
        eprintln!("error: unexpected argument '{extra}'");
        std::process::exit(1);
    }

    let config = Config::load()?;
    std::fs::create_dir_all(&config.state_dir)?;

    // One process per role.
    let _lock = match acquire_lock(&config.state_dir, role) {
        Ok(lock) => lock,
        Err(lifecycle::LifecycleError::LockFailed { role, path }) => {
            let pid = std::fs::read_to_string(&path)
                .unwrap_or_default()
                .trim()
                .to_string();
            eprintln!("wardend {role} is already running");
            if !pid.is_empty() {
                eprintln!("  pid: {pid}");
            }
            std::process::exit(1);
        }
        Err(e) => return Err(e.into()),
    };

    let log_path = config.logs_dir.join(format!("{role}.log"));
    rotate_log_if_needed(&log_path);
    write_startup_marker(&log_path, role)?;
    let _log_guard = setup_logging(&config.logs_dir, role)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        role = %role,
        state_dir = %config.state_dir.display(),
        "starting wardend"
    );

    let result = match role {
        Role::Guardian => roles::run_guardian(config).await,
        Role::Dispatcher => roles::run_dispatcher(config).await,
        Role::Scheduler => roles::run_scheduler(config).await,
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "daemon exited with error");
    }
    result
}

fn print_help() {
    println!("wardend {}", env!("CARGO_PKG_VERSION"));
    println!("warden daemon - keeps the assistant alive and fed");
    println!();
    println!("USAGE:");
    println!("    wardend <ROLE>");
    println!();
    println!("ROLES:");
    println!("    guardian      liveness, restarts, heartbeats, status file");
    println!("    dispatcher    queue draining and pane delivery");
    println!("    scheduler     time-driven task dispatch");
    println!();
    println!("OPTIONS:");
    println!("    -h, --help       Print help information");
    println!("    -v, --version    Print version information");
}
