// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Channel egress adapters.
//!
//! Outbound messages leave the core through a per-channel send
//! executable. The adapter only knows the contract: exit code 0 means
//! delivered.

mod skill;

pub use skill::SkillChannelSender;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeChannelSender, SendCall};

use async_trait::async_trait;
use thiserror::Error;

/// Errors from channel send operations
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("no send executable for channel {0}")]
    UnknownChannel(String),
    #[error("send failed: {0}")]
    SendFailed(String),
}

/// Adapter for delivering content to an external chat channel.
#[async_trait]
pub trait ChannelSender: Clone + Send + Sync + 'static {
    /// Deliver `content` to `channel`, optionally addressed to a
    /// per-channel endpoint.
    async fn send(
        &self,
        channel: &str,
        endpoint: Option<&str>,
        content: &str,
    ) -> Result<(), NotifyError>;
}
