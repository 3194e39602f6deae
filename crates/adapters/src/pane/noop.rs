// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! No-op pane controller

use super::{PaneController, PaneError};
use async_trait::async_trait;
use std::path::Path;

/// Pane controller that accepts everything and observes nothing.
/// Useful for dry runs and environments without a multiplexer.
#[derive(Clone, Copy, Default)]
pub struct NoOpPane;

impl NoOpPane {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PaneController for NoOpPane {
    async fn has_session(&self, _session: &str) -> Result<bool, PaneError> {
        Ok(false)
    }

    async fn create_session(
        &self,
        _session: &str,
        _cwd: &Path,
        _cmd: &str,
    ) -> Result<(), PaneError> {
        Ok(())
    }

    async fn kill_session(&self, _session: &str) -> Result<(), PaneError> {
        Ok(())
    }

    async fn paste_and_enter(&self, _session: &str, _content: &str) -> Result<(), PaneError> {
        Ok(())
    }

    async fn pane_activity_time(&self, _session: &str) -> Result<Option<i64>, PaneError> {
        Ok(None)
    }

    async fn foreground_process_matches(
        &self,
        _session: &str,
        _pattern: &str,
    ) -> Result<bool, PaneError> {
        Ok(false)
    }
}
