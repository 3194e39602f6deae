// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Guardian activity log.
//!
//! A human-readable, append-only trail of restarts, state changes, and
//! health transitions. Truncated to the last N lines when the day rolls
//! over so it never grows without bound. Logging failures are swallowed;
//! the log must never break the guardian.

use std::io::Write;
use std::path::PathBuf;
use warden_core::format_unix;

/// Lines kept after the daily truncation.
pub const DEFAULT_MAX_LINES: usize = 2_000;

pub struct ActivityLog {
    path: PathBuf,
    max_lines: usize,
    last_day: Option<i64>,
}

impl ActivityLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            max_lines: DEFAULT_MAX_LINES,
            last_day: None,
        }
    }

    pub fn with_max_lines(mut self, max_lines: usize) -> Self {
        self.max_lines = max_lines;
        self
    }

    /// Append a timestamped line, truncating first when the day rolled.
    pub fn append(&mut self, now: i64, message: &str) {
        let day = now.div_euclid(86_400);
        if self.last_day.is_some_and(|d| d != day) {
            self.truncate_to_tail();
        }
        self.last_day = Some(day);

        if let Some(parent) = self.path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        if let Ok(mut file) = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
        {
            let _ = writeln!(file, "[{}] {}", format_unix(now), message);
        }
    }

    fn truncate_to_tail(&self) {
        let Ok(raw) = std::fs::read_to_string(&self.path) else {
            return;
        };
        let lines: Vec<&str> = raw.lines().collect();
        if lines.len() <= self.max_lines {
            return;
        }
        let tail = &lines[lines.len() - self.max_lines..];
        let _ = std::fs::write(&self.path, format!("{}\n", tail.join("\n")));
    }
}

#[cfg(test)]
#[path = "activity_log_tests.rs"]
mod tests;
