// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pending-channels list.
//!
//! While health is not ok, refused ingress records its (channel,
//! endpoint) here so the guardian can notify each of them exactly once
//! when service returns. One JSON object per line, deduplicated on
//! write.

use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::PathBuf;

/// A channel + endpoint awaiting a recovery notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingChannel {
    pub channel: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

/// The on-disk pending list.
#[derive(Debug, Clone)]
pub struct PendingChannels {
    path: PathBuf,
}

impl PendingChannels {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Append an entry unless it is already present. Returns whether the
    /// entry was newly added.
    pub fn record(&self, channel: &str, endpoint: Option<&str>) -> std::io::Result<bool> {
        let entry = PendingChannel {
            channel: channel.to_string(),
            endpoint: endpoint.map(str::to_string),
        };
        if self.list()?.contains(&entry) {
            return Ok(false);
        }
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let line = serde_json::to_string(&entry)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        writeln!(file, "{line}")?;
        Ok(true)
    }

    /// All recorded entries. Malformed lines are skipped.
    pub fn list(&self) -> std::io::Result<Vec<PendingChannel>> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };
        let mut entries: Vec<PendingChannel> = Vec::new();
        for line in raw.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<PendingChannel>(line) {
                Ok(entry) => {
                    if !entries.contains(&entry) {
                        entries.push(entry);
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "skipping malformed pending-channels line");
                }
            }
        }
        Ok(entries)
    }

    /// Read all entries and clear the list.
    pub fn drain(&self) -> std::io::Result<Vec<PendingChannel>> {
        let entries = self.list()?;
        if !entries.is_empty() || self.path.exists() {
            std::fs::write(&self.path, b"")?;
        }
        Ok(entries)
    }
}

#[cfg(test)]
#[path = "pending_tests.rs"]
mod tests;
