// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tmux pane adapter

use super::{PaneController, PaneError};
use crate::subprocess::{run_with_timeout, PROCESS_CHECK_TIMEOUT, TMUX_TIMEOUT};
use async_trait::async_trait;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;

/// Delay between pasting the buffer and pressing ENTER, giving the host
/// application time to process the paste.
const PASTE_SETTLE: Duration = Duration::from_millis(200);

static BUFFER_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Tmux-based pane controller
#[derive(Clone, Default)]
pub struct TmuxPane {
    _priv: Arc<()>,
}

impl TmuxPane {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer names are unique per pid + counter + timestamp so that
    /// concurrent writers (dispatcher, restart path, transient CLIs)
    /// cannot clobber each other's paste buffers.
    fn next_buffer_name() -> String {
        let counter = BUFFER_COUNTER.fetch_add(1, Ordering::Relaxed);
        let ts = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        format!("warden-{}-{}-{}", std::process::id(), counter, ts)
    }
}

async fn tmux(args: &[&str], description: &str) -> Result<std::process::Output, PaneError> {
    let mut cmd = Command::new("tmux");
    cmd.args(args);
    run_with_timeout(cmd, TMUX_TIMEOUT, description)
        .await
        .map_err(PaneError::CommandFailed)
}

#[async_trait]
impl PaneController for TmuxPane {
    async fn has_session(&self, session: &str) -> Result<bool, PaneError> {
        let output = tmux(&["has-session", "-t", session], "tmux has-session").await?;
        Ok(output.status.success())
    }

    async fn create_session(
        &self,
        session: &str,
        cwd: &Path,
        cmd: &str,
    ) -> Result<(), PaneError> {
        // tmux reports a confusing error for a bad -c dir; check up front
        if !cwd.exists() {
            return Err(PaneError::SpawnFailed(format!(
                "working directory does not exist: {}",
                cwd.display()
            )));
        }

        let cwd_str = cwd.display().to_string();
        let output = tmux(
            &["new-session", "-d", "-s", session, "-c", &cwd_str, cmd],
            "tmux new-session",
        )
        .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::error!(session, stderr = %stderr, "tmux spawn failed");
            return Err(PaneError::SpawnFailed(stderr.to_string()));
        }

        // A zero exit can still carry warnings on stderr; keep them visible
        if !output.stderr.is_empty() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::warn!(session, stderr = %stderr, "tmux spawn stderr (non-fatal)");
        }

        Ok(())
    }

    async fn kill_session(&self, session: &str) -> Result<(), PaneError> {
        // Non-zero exit means the session was already gone; kill stays
        // idempotent either way.
        let _ = tmux(&["kill-session", "-t", session], "tmux kill-session").await?;
        Ok(())
    }

    async fn paste_and_enter(&self, session: &str, content: &str) -> Result<(), PaneError> {
        let buffer = Self::next_buffer_name();

        let set = tmux(
            &["set-buffer", "-b", &buffer, "--", content],
            "tmux set-buffer",
        )
        .await?;
        if !set.status.success() {
            return Err(PaneError::CommandFailed(
                String::from_utf8_lossy(&set.stderr).to_string(),
            ));
        }

        let result: Result<(), PaneError> = async {
            let paste = tmux(
                &["paste-buffer", "-b", &buffer, "-t", session],
                "tmux paste-buffer",
            )
            .await?;
            if !paste.status.success() {
                return Err(PaneError::NotFound(session.to_string()));
            }

            tokio::time::sleep(PASTE_SETTLE).await;

            let enter = tmux(&["send-keys", "-t", session, "Enter"], "tmux send-keys").await?;
            if !enter.status.success() {
                return Err(PaneError::NotFound(session.to_string()));
            }
            Ok(())
        }
        .await;

        // Delete the buffer on success and on error.
        let _ = tmux(&["delete-buffer", "-b", &buffer], "tmux delete-buffer").await;

        result
    }

    async fn pane_activity_time(&self, session: &str) -> Result<Option<i64>, PaneError> {
        let output = tmux(
            &[
                "display-message",
                "-p",
                "-t",
                session,
                "#{window_activity}",
            ],
            "tmux display-message",
        )
        .await?;

        if !output.status.success() {
            return Ok(None);
        }

        let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok(text.parse::<i64>().ok())
    }

    async fn foreground_process_matches(
        &self,
        session: &str,
        pattern: &str,
    ) -> Result<bool, PaneError> {
        let output = tmux(
            &["list-panes", "-t", session, "-F", "#{pane_pid}"],
            "tmux list-panes",
        )
        .await?;

        if !output.status.success() {
            return Err(PaneError::NotFound(session.to_string()));
        }

        let pane_pid = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if pane_pid.is_empty() {
            return Ok(false);
        }

        // The assistant is either a child of the pane process (started
        // through a shell) or the pane process itself (tmux exec'd the
        // command directly). The shell case is the common one, so probe
        // the children first and skip the second lookup on a hit.
        let mut pgrep = Command::new("pgrep");
        pgrep.args(["-P", &pane_pid, "-f", pattern]);
        let children = run_with_timeout(pgrep, PROCESS_CHECK_TIMEOUT, "pgrep")
            .await
            .map_err(PaneError::CommandFailed)?;
        if children.status.success() {
            return Ok(true);
        }

        let mut ps = Command::new("ps");
        ps.args(["-p", &pane_pid, "-o", "command="]);
        let pane_proc = run_with_timeout(ps, PROCESS_CHECK_TIMEOUT, "ps")
            .await
            .map_err(PaneError::CommandFailed)?;
        Ok(pane_proc.status.success()
            && String::from_utf8_lossy(&pane_proc.stdout).contains(pattern))
    }
}

#[cfg(test)]
#[path = "tmux_tests.rs"]
mod tests;
