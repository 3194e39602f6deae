// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! warden CLI library.
//!
//! The `warden` binary is the integration surface for channel adapters,
//! the assistant itself (acks, task completion, checkpoints), and the
//! operator. Commands open the shared store directly; the daemons pick
//! up whatever they write on their next tick.

pub mod commands;
pub mod context;
pub mod output;

pub use context::Context;
