// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Skills-directory channel sender.
//!
//! Each channel ships a `send` executable under
//! `<skills_dir>/<channel>/send`. It receives the endpoint (when given)
//! and the content as arguments; exit code 0 means delivered.

use super::{ChannelSender, NotifyError};
use crate::subprocess::{run_with_timeout, CHANNEL_SEND_TIMEOUT};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::process::Command;

#[derive(Clone)]
pub struct SkillChannelSender {
    skills_dir: Arc<PathBuf>,
}

impl SkillChannelSender {
    pub fn new(skills_dir: impl Into<PathBuf>) -> Self {
        Self {
            skills_dir: Arc::new(skills_dir.into()),
        }
    }

    fn send_executable(&self, channel: &str) -> PathBuf {
        self.skills_dir.join(channel).join("send")
    }
}

#[async_trait]
impl ChannelSender for SkillChannelSender {
    async fn send(
        &self,
        channel: &str,
        endpoint: Option<&str>,
        content: &str,
    ) -> Result<(), NotifyError> {
        let exe = self.send_executable(channel);
        if !exe.exists() {
            return Err(NotifyError::UnknownChannel(channel.to_string()));
        }

        let mut cmd = Command::new(&exe);
        if let Some(endpoint) = endpoint {
            cmd.arg(endpoint);
        }
        cmd.arg(content);

        let output = run_with_timeout(
            cmd,
            CHANNEL_SEND_TIMEOUT,
            &format!("send to {channel}"),
        )
        .await
        .map_err(NotifyError::SendFailed)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::warn!(channel, stderr = %stderr, "channel send exited with non-zero status");
            return Err(NotifyError::SendFailed(format!(
                "{} exited with {}",
                exe.display(),
                output.status
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
#[path = "skill_tests.rs"]
mod tests;
