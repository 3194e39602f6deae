// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session-start text for the assistant.
//!
//! Emitted by `warden session-init` and injected into the pane when the
//! assistant starts: identity and reference files, current supervision
//! state, and the conversations accumulated since the last checkpoint,
//! with a memory-sync nudge once they pile up.

use crate::EngineError;
use std::path::PathBuf;
use warden_core::{format_unix, Conversation, StatusFile};
use warden_storage::Store;

/// Unsummarized-conversation count at which the memory-sync instruction
/// is included.
pub const DEFAULT_SYNC_THRESHOLD: i64 = 20;

/// Cap on transcript rows included inline.
const TRANSCRIPT_LIMIT: usize = 200;

#[derive(Debug, Clone, Default)]
pub struct SessionInitConfig {
    pub identity_path: Option<PathBuf>,
    pub reference_paths: Vec<PathBuf>,
    pub sync_threshold: i64,
}

/// Render a human-readable transcript of conversation rows.
pub fn format_transcript(rows: &[Conversation]) -> String {
    let mut out = String::new();
    for row in rows {
        let target = match &row.endpoint_id {
            Some(endpoint) => format!("{}/{}", row.channel, endpoint),
            None => row.channel.clone(),
        };
        out.push_str(&format!(
            "[{}] {} {}: {}\n",
            format_unix(row.timestamp),
            row.direction,
            target,
            row.content
        ));
    }
    out
}

/// Render the full session-init text.
pub fn render(
    store: &Store,
    status: Option<&StatusFile>,
    cfg: &SessionInitConfig,
) -> Result<String, EngineError> {
    let mut out = String::new();
    out.push_str("# warden session start\n\n");

    if let Some(status) = status {
        out.push_str(&format!(
            "Supervision: state {}, health {}, idle {}s\n",
            status.state, status.health, status.idle_seconds
        ));
    }
    if let Some(identity) = &cfg.identity_path {
        out.push_str(&format!("Identity: {}\n", identity.display()));
    }
    if !cfg.reference_paths.is_empty() {
        out.push_str("References:\n");
        for path in &cfg.reference_paths {
            out.push_str(&format!("  - {}\n", path.display()));
        }
    }

    let count = store.unsummarized_count()?;
    if count == 0 {
        out.push_str("\nNo new conversations since the last sync.\n");
        return Ok(out);
    }

    let rows = store.unsummarized_conversations(Some(TRANSCRIPT_LIMIT))?;
    out.push_str(&format!("\n## Conversations since last sync ({count})\n\n"));
    out.push_str(&format_transcript(&rows));

    let threshold = if cfg.sync_threshold > 0 {
        cfg.sync_threshold
    } else {
        DEFAULT_SYNC_THRESHOLD
    };
    if count >= threshold {
        let end_id = rows.last().map(|r| r.id).unwrap_or(0);
        out.push_str(&format!(
            "\n{count} conversations are unsummarized. Summarize them into memory, \
             then run: warden checkpoint create {end_id}\n"
        ));
    }

    Ok(out)
}

#[cfg(test)]
#[path = "session_init_tests.rs"]
mod tests;
