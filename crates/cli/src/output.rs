// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Output helpers: human-readable by default, `--json` for machines.

use anyhow::Result;
use serde::Serialize;
use warden_core::format_elapsed;

/// Print a value as pretty JSON.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Format a timestamp as relative time in the future ("in 5m").
pub fn format_time_until(unix: i64, now: i64) -> String {
    if unix <= now {
        return "due".to_string();
    }
    format!("in {}", format_elapsed(unix - now))
}

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;
