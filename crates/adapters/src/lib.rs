// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! warden-adapters: process-boundary adapters for the warden supervisor.
//!
//! Everything here wraps a shellout: the tmux pane, the per-channel send
//! executables, and process-table introspection. Each adapter has a fake
//! for tests behind the `test-support` feature.

pub mod notify;
pub mod pane;
pub mod process;
pub mod subprocess;

pub use notify::{ChannelSender, NotifyError, SkillChannelSender};
pub use pane::{PaneController, PaneError, TmuxPane};
pub use process::{PgrepProbe, ProcessError, ProcessProbe};

#[cfg(any(test, feature = "test-support"))]
pub use notify::{FakeChannelSender, SendCall};
#[cfg(any(test, feature = "test-support"))]
pub use pane::{FakePane, PaneCall};
#[cfg(any(test, feature = "test-support"))]
pub use process::FakeProcessProbe;
