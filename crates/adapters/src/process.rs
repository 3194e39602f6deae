// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process-table introspection.
//!
//! The guardian must not race maintenance scripts (restart, upgrade,
//! installer) when bringing the assistant back up. This adapter answers
//! one question: is any process matching these patterns currently alive?

use crate::subprocess::{run_with_timeout, PROCESS_CHECK_TIMEOUT};
use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;

/// Errors from process checks
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("process check failed: {0}")]
    CheckFailed(String),
}

/// Adapter for scanning the process table.
#[async_trait]
pub trait ProcessProbe: Clone + Send + Sync + 'static {
    /// Whether any live process matches one of the command-line patterns.
    async fn any_matching(&self, patterns: &[String]) -> Result<bool, ProcessError>;
}

/// pgrep-based probe for production use.
#[derive(Clone, Copy, Default)]
pub struct PgrepProbe;

impl PgrepProbe {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProcessProbe for PgrepProbe {
    async fn any_matching(&self, patterns: &[String]) -> Result<bool, ProcessError> {
        for pattern in patterns {
            let mut cmd = Command::new("pgrep");
            cmd.args(["-f", pattern]);
            let output = run_with_timeout(cmd, PROCESS_CHECK_TIMEOUT, "pgrep")
                .await
                .map_err(ProcessError::CheckFailed)?;
            // pgrep exits 0 when at least one process matched.
            if output.status.success() {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

/// Fake probe for testing
#[cfg(any(test, feature = "test-support"))]
#[derive(Clone, Default)]
pub struct FakeProcessProbe {
    matching: std::sync::Arc<std::sync::atomic::AtomicBool>,
}

#[cfg(any(test, feature = "test-support"))]
impl FakeProcessProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_matching(&self, matching: bool) {
        self.matching
            .store(matching, std::sync::atomic::Ordering::SeqCst);
    }
}

#[cfg(any(test, feature = "test-support"))]
#[async_trait]
impl ProcessProbe for FakeProcessProbe {
    async fn any_matching(&self, _patterns: &[String]) -> Result<bool, ProcessError> {
        Ok(self.matching.load(std::sync::atomic::Ordering::SeqCst))
    }
}

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;
