// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dispatcher role loop

use crate::config::Config;
use std::sync::Arc;
use warden_adapters::TmuxPane;
use warden_core::SystemClock;
use warden_engine::dispatcher::{Dispatcher, DispatcherConfig, PollOutcome, POLL_INTERVAL_IDLE};
use warden_storage::Store;

pub async fn run_dispatcher(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(Store::open(&config.db_path)?);
    let dispatcher = Dispatcher::new(
        store,
        TmuxPane::new(),
        Arc::new(SystemClock),
        DispatcherConfig::new(config.settings.session.clone(), config.status_path.clone()),
    );

    tracing::info!(session = %config.settings.session, "dispatcher started");

    let shutdown = super::shutdown_signal();
    tokio::pin!(shutdown);

    // The poll cadence tightens right after a delivery so bursts drain
    // quickly, and relaxes when the queues are empty.
    let mut delay = POLL_INTERVAL_IDLE;
    loop {
        tokio::select! {
            _ = tokio::time::sleep(delay) => {
                delay = match dispatcher.poll_once().await {
                    Ok(outcome) => outcome.next_delay(),
                    Err(e) => {
                        tracing::error!(error = %e, "dispatcher poll failed");
                        PollOutcome::Empty.next_delay()
                    }
                };
            }
            result = &mut shutdown => {
                result?;
                break;
            }
        }
    }

    tracing::info!("dispatcher stopped");
    Ok(())
}
