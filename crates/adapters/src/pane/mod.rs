// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pane controller adapters.
//!
//! The assistant lives in a terminal-multiplexer pane. The supervisor
//! needs exactly one write primitive — paste a block of text and press
//! ENTER — plus a handful of observations: does the pane exist, is the
//! assistant process running in it, and when was it last active.

mod noop;
mod tmux;

pub use noop::NoOpPane;
pub use tmux::TmuxPane;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakePane, PaneCall};

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

/// Errors from pane operations
#[derive(Debug, Error)]
pub enum PaneError {
    #[error("session not found: {0}")]
    NotFound(String),
    #[error("spawn failed: {0}")]
    SpawnFailed(String),
    #[error("command failed: {0}")]
    CommandFailed(String),
}

/// Adapter for the terminal-multiplexer pane hosting the assistant.
#[async_trait]
pub trait PaneController: Clone + Send + Sync + 'static {
    /// Check whether the session exists.
    async fn has_session(&self, session: &str) -> Result<bool, PaneError>;

    /// Create a new detached session running `cmd` in `cwd`.
    async fn create_session(
        &self,
        session: &str,
        cwd: &Path,
        cmd: &str,
    ) -> Result<(), PaneError>;

    /// Kill the session. Idempotent: killing a dead session is not an error.
    async fn kill_session(&self, session: &str) -> Result<(), PaneError>;

    /// Paste a block of text into the pane and press ENTER.
    async fn paste_and_enter(&self, session: &str, content: &str) -> Result<(), PaneError>;

    /// Unix seconds of the pane's last activity, if the session exists.
    async fn pane_activity_time(&self, session: &str) -> Result<Option<i64>, PaneError>;

    /// Whether a process matching `pattern` is the pane's foreground
    /// process or a child of it.
    async fn foreground_process_matches(
        &self,
        session: &str,
        pattern: &str,
    ) -> Result<bool, PaneError>;
}
