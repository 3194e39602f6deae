// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process lifecycle: roles, lock files, and log rotation.

use fs2::FileExt;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("no state directory available (set WARDEN_STATE_DIR or HOME)")]
    NoStateDir,
    #[error("another {role} is already running (lock: {path})")]
    LockFailed { role: String, path: PathBuf },
    #[error("invalid settings file {path}: {reason}")]
    InvalidSettings { path: PathBuf, reason: String },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Which daemon this process is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Guardian,
    Dispatcher,
    Scheduler,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Guardian => "guardian",
            Role::Dispatcher => "dispatcher",
            Role::Scheduler => "scheduler",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "guardian" => Some(Role::Guardian),
            "dispatcher" => Some(Role::Dispatcher),
            "scheduler" => Some(Role::Scheduler),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Exclusive per-role lock. Held for the process lifetime; the lock
/// releases on drop (or process exit).
pub struct RoleLock {
    // NOTE(lifetime): held to maintain the exclusive file lock
    #[allow(dead_code)]
    file: File,
    pub path: PathBuf,
}

/// Acquire the role's lock file and record our pid in it.
pub fn acquire_lock(state_dir: &Path, role: Role) -> Result<RoleLock, LifecycleError> {
    std::fs::create_dir_all(state_dir)?;
    let path = state_dir.join(format!("{role}.pid"));
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(false)
        .open(&path)?;

    if file.try_lock_exclusive().is_err() {
        return Err(LifecycleError::LockFailed {
            role: role.to_string(),
            path,
        });
    }

    file.set_len(0)?;
    writeln!(file, "{}", std::process::id())?;
    Ok(RoleLock { file, path })
}

/// Maximum log file size before rotation (10 MB).
const MAX_LOG_SIZE: u64 = 10 * 1024 * 1024;

/// Number of rotated log files to keep.
const MAX_ROTATED_LOGS: u32 = 3;

/// Rotate the role log file if it exceeds [`MAX_LOG_SIZE`].
///
/// Shifts `<role>.log` -> `.1` -> `.2` -> `.3`, deleting the oldest.
/// Best-effort: rotation failures are silently ignored so the daemon
/// still starts.
pub fn rotate_log_if_needed(log_path: &Path) {
    let size = match std::fs::metadata(log_path) {
        Ok(m) => m.len(),
        Err(_) => return,
    };

    if size < MAX_LOG_SIZE {
        return;
    }

    let log_str = log_path.display().to_string();
    for i in (1..MAX_ROTATED_LOGS).rev() {
        let from = format!("{log_str}.{i}");
        let to = format!("{log_str}.{}", i + 1);
        let _ = std::fs::rename(&from, &to);
    }
    let _ = std::fs::rename(log_path, format!("{log_str}.1"));
}

/// Startup marker prefix written to the log before tracing is up, so the
/// current startup attempt can be found by scanning the file.
pub const STARTUP_MARKER_PREFIX: &str = "--- wardend: starting (pid: ";

/// Append the startup marker to the role log.
pub fn write_startup_marker(log_path: &Path, role: Role) -> Result<(), LifecycleError> {
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)?;
    writeln!(
        file,
        "{}{}, role: {}) ---\n",
        STARTUP_MARKER_PREFIX,
        std::process::id(),
        role
    )?;
    Ok(())
}

/// Set up tracing to the role's log file with env-filter control.
pub fn setup_logging(
    logs_dir: &Path,
    role: Role,
) -> Result<tracing_appender::non_blocking::WorkerGuard, LifecycleError> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    std::fs::create_dir_all(logs_dir)?;

    let file_appender =
        tracing_appender::rolling::never(logs_dir, format!("{role}.log"));
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking))
        .init();

    Ok(guard)
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
