// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake pane controller for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{PaneController, PaneError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Recorded pane call
#[derive(Debug, Clone)]
pub enum PaneCall {
    HasSession { session: String },
    CreateSession { session: String, cwd: PathBuf, cmd: String },
    KillSession { session: String },
    PasteAndEnter { session: String, content: String },
    PaneActivityTime { session: String },
    ForegroundProcessMatches { session: String, pattern: String },
}

#[derive(Debug, Clone, Default)]
struct FakeSessionState {
    alive: bool,
    process_running: bool,
    activity_time: Option<i64>,
}

#[derive(Default)]
struct FakePaneState {
    session: Option<(String, FakeSessionState)>,
    calls: Vec<PaneCall>,
    /// When set, paste_and_enter fails with this error message.
    paste_error: Option<String>,
    pastes: Vec<String>,
}

/// Fake pane controller for testing
#[derive(Clone, Default)]
pub struct FakePane {
    inner: Arc<Mutex<FakePaneState>>,
}

impl FakePane {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a fake with a live session hosting a running process.
    pub fn with_live_session(session: &str) -> Self {
        let pane = Self::new();
        pane.add_session(session, true, true);
        pane
    }

    pub fn add_session(&self, session: &str, alive: bool, process_running: bool) {
        self.inner.lock().session = Some((
            session.to_string(),
            FakeSessionState {
                alive,
                process_running,
                activity_time: None,
            },
        ));
    }

    pub fn remove_session(&self) {
        self.inner.lock().session = None;
    }

    pub fn set_process_running(&self, running: bool) {
        if let Some((_, state)) = self.inner.lock().session.as_mut() {
            state.process_running = running;
        }
    }

    pub fn set_activity_time(&self, at: i64) {
        if let Some((_, state)) = self.inner.lock().session.as_mut() {
            state.activity_time = Some(at);
        }
    }

    /// Make subsequent paste_and_enter calls fail.
    pub fn fail_pastes(&self, message: &str) {
        self.inner.lock().paste_error = Some(message.to_string());
    }

    /// Make subsequent paste_and_enter calls succeed again.
    pub fn allow_pastes(&self) {
        self.inner.lock().paste_error = None;
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<PaneCall> {
        self.inner.lock().calls.clone()
    }

    /// All successfully pasted contents, in order.
    pub fn pastes(&self) -> Vec<String> {
        self.inner.lock().pastes.clone()
    }

    pub fn kill_count(&self) -> usize {
        self.inner
            .lock()
            .calls
            .iter()
            .filter(|c| matches!(c, PaneCall::KillSession { .. }))
            .count()
    }

    fn session_alive(&self, session: &str) -> bool {
        self.inner
            .lock()
            .session
            .as_ref()
            .is_some_and(|(name, state)| name == session && state.alive)
    }
}

#[async_trait]
impl PaneController for FakePane {
    async fn has_session(&self, session: &str) -> Result<bool, PaneError> {
        self.inner.lock().calls.push(PaneCall::HasSession {
            session: session.to_string(),
        });
        Ok(self.session_alive(session))
    }

    async fn create_session(
        &self,
        session: &str,
        cwd: &Path,
        cmd: &str,
    ) -> Result<(), PaneError> {
        let mut inner = self.inner.lock();
        inner.calls.push(PaneCall::CreateSession {
            session: session.to_string(),
            cwd: cwd.to_path_buf(),
            cmd: cmd.to_string(),
        });
        inner.session = Some((
            session.to_string(),
            FakeSessionState {
                alive: true,
                process_running: true,
                activity_time: None,
            },
        ));
        Ok(())
    }

    async fn kill_session(&self, session: &str) -> Result<(), PaneError> {
        let mut inner = self.inner.lock();
        inner.calls.push(PaneCall::KillSession {
            session: session.to_string(),
        });
        if let Some((name, state)) = inner.session.as_mut() {
            if name == session {
                state.alive = false;
                state.process_running = false;
            }
        }
        Ok(())
    }

    async fn paste_and_enter(&self, session: &str, content: &str) -> Result<(), PaneError> {
        let mut inner = self.inner.lock();
        inner.calls.push(PaneCall::PasteAndEnter {
            session: session.to_string(),
            content: content.to_string(),
        });
        if let Some(msg) = inner.paste_error.clone() {
            return Err(PaneError::CommandFailed(msg));
        }
        let alive = inner
            .session
            .as_ref()
            .is_some_and(|(name, state)| name == session && state.alive);
        if !alive {
            return Err(PaneError::NotFound(session.to_string()));
        }
        inner.pastes.push(content.to_string());
        Ok(())
    }

    async fn pane_activity_time(&self, session: &str) -> Result<Option<i64>, PaneError> {
        let mut inner = self.inner.lock();
        inner.calls.push(PaneCall::PaneActivityTime {
            session: session.to_string(),
        });
        Ok(inner
            .session
            .as_ref()
            .filter(|(name, state)| name == session && state.alive)
            .and_then(|(_, state)| state.activity_time))
    }

    async fn foreground_process_matches(
        &self,
        session: &str,
        pattern: &str,
    ) -> Result<bool, PaneError> {
        let mut inner = self.inner.lock();
        inner.calls.push(PaneCall::ForegroundProcessMatches {
            session: session.to_string(),
            pattern: pattern.to_string(),
        });
        Ok(inner
            .session
            .as_ref()
            .is_some_and(|(name, state)| name == session && state.alive && state.process_running))
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
