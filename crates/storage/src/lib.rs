// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! warden-storage: the persistent store for the warden supervisor.
//!
//! One embedded SQLite database in WAL mode holds the conversation and
//! control queues, the task table with its history, checkpoints, and the
//! supervision health register. Cross-process coordination happens through
//! conditional updates (`UPDATE ... WHERE status = 'pending'`) whose
//! affected-row count decides who won a claim.

mod checkpoints;
mod controls;
mod conversations;
mod error;
mod migrations;
mod store;
mod supervisor;
mod tasks;

pub use controls::AckOutcome;
pub use error::StorageError;
pub use store::Store;
pub use supervisor::SupervisorState;

pub type Result<T> = std::result::Result<T, StorageError>;
