// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Guardian role loop

use crate::config::Config;
use std::sync::Arc;
use warden_adapters::{PgrepProbe, SkillChannelSender, TmuxPane};
use warden_core::SystemClock;
use warden_engine::guardian::{Guardian, GuardianConfig, TICK_INTERVAL};
use warden_engine::heartbeat::HeartbeatConfig;
use warden_storage::Store;

pub async fn run_guardian(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(Store::open(&config.db_path)?);

    let guardian_cfg = GuardianConfig {
        session: config.settings.session.clone(),
        assistant_cmd: config.settings.assistant_cmd.clone(),
        assistant_cwd: config.assistant_cwd(),
        process_pattern: config.settings.process_pattern.clone(),
        transcript_dir: config.settings.transcript_dir.clone(),
        status_path: config.status_path.clone(),
        pending_path: config.pending_path.clone(),
        activity_log_path: config.activity_log_path(),
        idle_threshold: config.settings.idle_threshold_secs,
        restart_delay: config.settings.restart_delay_secs,
        restart_grace: config.settings.restart_grace_secs,
        stuck_after: config.settings.stuck_after_secs,
        maintenance_patterns: config.settings.maintenance_patterns.clone(),
        maintenance_wait_cap: config.settings.maintenance_wait_cap_secs,
        catch_up_prompt: config.catch_up_prompt(),
        recovery_notice: config.recovery_notice(),
    };
    let heartbeat_cfg = HeartbeatConfig {
        primary_interval: config.settings.heartbeat_interval_secs,
        ack_deadline: config.settings.heartbeat_ack_deadline_secs,
        down_retry_interval: config.settings.down_retry_interval_secs,
        rate_limit_probe_interval: config.settings.rate_limit_probe_interval_secs,
        ..HeartbeatConfig::default()
    };

    let mut guardian = Guardian::new(
        store,
        TmuxPane::new(),
        SkillChannelSender::new(config.skills_dir()),
        PgrepProbe::new(),
        Arc::new(SystemClock),
        guardian_cfg,
        heartbeat_cfg,
    );

    tracing::info!(session = %config.settings.session, "guardian started");

    let mut ticker = tokio::time::interval(TICK_INTERVAL);
    let shutdown = super::shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(e) = guardian.tick().await {
                    tracing::error!(error = %e, "guardian tick failed");
                }
            }
            result = &mut shutdown => {
                result?;
                break;
            }
        }
    }

    tracing::info!("guardian stopped");
    Ok(())
}
