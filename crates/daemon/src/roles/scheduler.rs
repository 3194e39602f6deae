// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scheduler role loop

use crate::config::Config;
use std::sync::Arc;
use warden_core::SystemClock;
use warden_engine::scheduler::{Scheduler, SchedulerConfig, CYCLE_INTERVAL};
use warden_storage::Store;

pub async fn run_scheduler(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(Store::open(&config.db_path)?);

    // A task table the scheduler cannot evaluate is a configuration
    // error; refuse to start rather than silently skipping tasks.
    Scheduler::validate_tasks(&store)?;

    let mut scheduler = Scheduler::new(
        Arc::clone(&store),
        Arc::new(SystemClock),
        SchedulerConfig::new(config.status_path.clone()),
    );

    tracing::info!("scheduler started");

    let mut ticker = tokio::time::interval(CYCLE_INTERVAL);
    let shutdown = super::shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match scheduler.cycle() {
                    Ok(report) => {
                        if let Some(task_id) = &report.dispatched {
                            tracing::info!(%task_id, "dispatched task");
                        }
                    }
                    Err(e) => tracing::error!(error = %e, "scheduler cycle failed"),
                }
            }
            result = &mut shutdown => {
                result?;
                break;
            }
        }
    }

    tracing::info!("scheduler stopped");
    Ok(())
}
