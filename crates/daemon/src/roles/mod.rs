// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Role work loops.
//!
//! Each loop is the same shape: build the component out of the shared
//! store and the real adapters, then `tokio::select!` between the work
//! tick and the shutdown signals. Recoverable errors are logged and the
//! loop advances; only startup errors abort.

mod dispatcher;
mod guardian;
mod scheduler;

pub use dispatcher::run_dispatcher;
pub use guardian::run_guardian;
pub use scheduler::run_scheduler;

use tokio::signal::unix::{signal, SignalKind};

/// Wait for SIGINT or SIGTERM.
pub(crate) async fn shutdown_signal() -> std::io::Result<()> {
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    tokio::select! {
        _ = sigterm.recv() => tracing::info!("received SIGTERM, shutting down"),
        _ = sigint.recv() => tracing::info!("received SIGINT, shutting down"),
    }
    Ok(())
}
