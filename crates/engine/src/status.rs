// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Status file I/O.
//!
//! The guardian is the only writer; it writes a temp file in the same
//! directory and renames it over the target so readers never observe a
//! partial write. Readers fail open: a missing or malformed file simply
//! yields `None`.

use std::io::Write;
use std::path::Path;
use warden_core::StatusFile;

/// Atomically write the status file.
pub fn write_status(path: &Path, status: &StatusFile) -> std::io::Result<()> {
    let json = serde_json::to_string_pretty(status)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("tmp");
    {
        let mut file = std::fs::File::create(&tmp)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;
    }
    std::fs::rename(&tmp, path)?;
    Ok(())
}

/// Read the status file, failing open on any problem.
pub fn read_status(path: &Path) -> Option<StatusFile> {
    let raw = std::fs::read_to_string(path).ok()?;
    match serde_json::from_str(&raw) {
        Ok(status) => Some(status),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "malformed status file");
            None
        }
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
