// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine error types

use thiserror::Error;

/// Errors from supervision components
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("storage error: {0}")]
    Storage(#[from] warden_storage::StorageError),
    #[error("pane error: {0}")]
    Pane(#[from] warden_adapters::PaneError),
    #[error("channel send error: {0}")]
    Notify(#[from] warden_adapters::NotifyError),
    #[error("process check error: {0}")]
    Process(#[from] warden_adapters::ProcessError),
    #[error("invalid schedule: {0}")]
    Schedule(#[from] crate::schedule::ScheduleError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
