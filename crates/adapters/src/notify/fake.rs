// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake channel sender for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{ChannelSender, NotifyError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;

/// Recorded send call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendCall {
    pub channel: String,
    pub endpoint: Option<String>,
    pub content: String,
}

#[derive(Default)]
struct FakeSenderState {
    calls: Vec<SendCall>,
    fail: bool,
}

/// Fake channel sender for testing
#[derive(Clone, Default)]
pub struct FakeChannelSender {
    inner: Arc<Mutex<FakeSenderState>>,
}

impl FakeChannelSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<SendCall> {
        self.inner.lock().calls.clone()
    }

    pub fn set_failing(&self, fail: bool) {
        self.inner.lock().fail = fail;
    }
}

#[async_trait]
impl ChannelSender for FakeChannelSender {
    async fn send(
        &self,
        channel: &str,
        endpoint: Option<&str>,
        content: &str,
    ) -> Result<(), NotifyError> {
        let mut inner = self.inner.lock();
        if inner.fail {
            return Err(NotifyError::SendFailed("forced failure".to_string()));
        }
        inner.calls.push(SendCall {
            channel: channel.to_string(),
            endpoint: endpoint.map(str::to_string),
            content: content.to_string(),
        });
        Ok(())
    }
}
