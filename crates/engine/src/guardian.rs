// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The activity guardian.
//!
//! One tick per second: observe the pane, derive the assistant state,
//! restart on sustained absence, drive the heartbeat engine and apply
//! its actions, detect hangs, and broadcast everything through the
//! status file.

use crate::activity_log::ActivityLog;
use crate::health::HealthAction;
use crate::heartbeat::{HeartbeatConfig, HeartbeatEngine};
use crate::pending::PendingChannels;
use crate::{status, EngineError};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use warden_adapters::{ChannelSender, PaneController, ProcessProbe};
use warden_core::{AssistantState, Clock, Health, StatusFile};
use warden_storage::Store;

/// Guardian tick period.
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct GuardianConfig {
    /// Tmux session hosting the assistant.
    pub session: String,
    /// Command line that starts the assistant.
    pub assistant_cmd: String,
    pub assistant_cwd: PathBuf,
    /// Process name that must be the pane's foreground process (or a
    /// child of it) for the assistant to count as running.
    pub process_pattern: String,
    /// Directory of per-session transcript files written by the
    /// assistant; their newest mtime is the primary activity signal.
    pub transcript_dir: Option<PathBuf>,
    pub status_path: PathBuf,
    pub pending_path: PathBuf,
    pub activity_log_path: PathBuf,
    /// Seconds of quiet before busy becomes idle.
    pub idle_threshold: i64,
    /// Consecutive not-running ticks before a restart.
    pub restart_delay: i64,
    /// Seconds after a start during which not-running is not counted.
    pub restart_grace: i64,
    /// Seconds of transcript silence (with delivered work outstanding)
    /// before a stuck probe is requested.
    pub stuck_after: i64,
    /// Process patterns of maintenance scripts the restart must not race.
    pub maintenance_patterns: Vec<String>,
    /// Cap on waiting for maintenance scripts, seconds.
    pub maintenance_wait_cap: i64,
    /// Prompt pasted after a successful restart.
    pub catch_up_prompt: String,
    /// Message sent to each pending channel on recovery.
    pub recovery_notice: String,
}

/// What one tick observed and did, for logging and tests.
#[derive(Debug)]
pub struct TickReport {
    pub state: AssistantState,
    pub health: Health,
    pub restarted: bool,
    pub stuck_probe: Option<i64>,
}

/// Raw per-tick observations of the pane.
struct Observation {
    pane_exists: bool,
    process_running: bool,
    transcript_activity: Option<i64>,
    last_activity: Option<i64>,
}

pub struct Guardian<P: PaneController, C: ChannelSender, M: ProcessProbe> {
    store: Arc<Store>,
    pane: P,
    sender: C,
    probe: M,
    clock: Arc<dyn Clock>,
    cfg: GuardianConfig,
    heartbeat: HeartbeatEngine,
    pending: PendingChannels,
    activity_log: ActivityLog,
    not_running_ticks: i64,
    grace_until: Option<i64>,
    pending_catch_up: bool,
    maintenance_wait_since: Option<i64>,
    /// Transcript timestamp a stuck probe was already issued for.
    stuck_probe_marker: Option<i64>,
    last_state: Option<AssistantState>,
}

impl<P: PaneController, C: ChannelSender, M: ProcessProbe> Guardian<P, C, M> {
    pub fn new(
        store: Arc<Store>,
        pane: P,
        sender: C,
        probe: M,
        clock: Arc<dyn Clock>,
        cfg: GuardianConfig,
        heartbeat_cfg: HeartbeatConfig,
    ) -> Self {
        let pending = PendingChannels::new(&cfg.pending_path);
        let activity_log = ActivityLog::new(&cfg.activity_log_path);
        Self {
            store,
            pane,
            sender,
            probe,
            clock,
            cfg,
            heartbeat: HeartbeatEngine::new(heartbeat_cfg),
            pending,
            activity_log,
            not_running_ticks: 0,
            grace_until: None,
            pending_catch_up: false,
            maintenance_wait_since: None,
            stuck_probe_marker: None,
            last_state: None,
        }
    }

    pub async fn tick(&mut self) -> Result<TickReport, EngineError> {
        let now = self.clock.now();
        let obs = self.observe().await?;
        let mut state = derive_state(&obs, now, self.cfg.idle_threshold);

        // Restart path, paused entirely while rate limited.
        let mut restarted = false;
        if self.store.health()? != Health::RateLimited {
            restarted = self.restart_path(&obs, now).await?;
        }

        // Catch-up once the assistant is observed back and booted.
        if self.pending_catch_up
            && obs.process_running
            && self.grace_until.is_none_or(|until| now >= until)
        {
            match self
                .pane
                .paste_and_enter(&self.cfg.session, &self.cfg.catch_up_prompt)
                .await
            {
                Ok(()) => {
                    self.pending_catch_up = false;
                    self.activity_log.append(now, "pasted catch-up prompt");
                }
                Err(e) => {
                    // Retried on the next tick.
                    tracing::warn!(error = %e, "catch-up paste failed");
                }
            }
        }

        // Drive the heartbeat engine and perform its side effects.
        let hb = self.heartbeat.tick(&self.store, now)?;
        for action in &hb.actions {
            match action {
                HealthAction::KillSession => {
                    self.pane.kill_session(&self.cfg.session).await?;
                    self.activity_log.append(now, "killed pane after probe timeout");
                }
                HealthAction::NotifyPendingChannels => {
                    self.notify_pending_channels().await;
                    self.activity_log.append(now, "notified pending channels of recovery");
                }
                HealthAction::RecordRateLimitReset(_) => {}
            }
        }
        if hb.health_changed() {
            self.activity_log.append(
                now,
                &format!("health {} -> {}", hb.health_before, hb.health_after),
            );
        }

        let stuck_probe = self.detect_stuck(&obs, now)?;

        let health = hb.health_after;
        if health == Health::RateLimited {
            state = AssistantState::RateLimited;
        }

        let last_activity = obs.last_activity.unwrap_or(now);
        status::write_status(
            &self.cfg.status_path,
            &StatusFile {
                state,
                health,
                idle_seconds: (now - last_activity).max(0),
                last_activity,
                pid: None,
                updated_at: now,
            },
        )?;

        if self.last_state != Some(state) {
            self.activity_log.append(now, &format!("state -> {state}"));
            self.last_state = Some(state);
        }

        Ok(TickReport {
            state,
            health,
            restarted,
            stuck_probe,
        })
    }

    async fn observe(&self) -> Result<Observation, EngineError> {
        let pane_exists = self.pane.has_session(&self.cfg.session).await?;
        let process_running = pane_exists
            && self
                .pane
                .foreground_process_matches(&self.cfg.session, &self.cfg.process_pattern)
                .await?;
        let transcript_activity = self
            .cfg
            .transcript_dir
            .as_deref()
            .and_then(newest_mtime);
        let pane_activity = if pane_exists {
            self.pane.pane_activity_time(&self.cfg.session).await?
        } else {
            None
        };
        Ok(Observation {
            pane_exists,
            process_running,
            transcript_activity,
            last_activity: transcript_activity.or(pane_activity),
        })
    }

    /// Count consecutive not-running ticks and restart the assistant once
    /// they reach the delay, deferring to in-flight maintenance scripts.
    async fn restart_path(&mut self, obs: &Observation, now: i64) -> Result<bool, EngineError> {
        if obs.process_running {
            self.not_running_ticks = 0;
            self.maintenance_wait_since = None;
            return Ok(false);
        }

        // Grace window after a start: the assistant may still be booting.
        if self.grace_until.is_some_and(|until| now < until) {
            return Ok(false);
        }

        self.not_running_ticks += 1;
        if self.not_running_ticks < self.cfg.restart_delay {
            return Ok(false);
        }

        if !self.cfg.maintenance_patterns.is_empty()
            && self.probe.any_matching(&self.cfg.maintenance_patterns).await?
        {
            let since = *self.maintenance_wait_since.get_or_insert(now);
            if now - since < self.cfg.maintenance_wait_cap {
                tracing::info!("maintenance script in flight; delaying restart");
                return Ok(false);
            }
            tracing::warn!("maintenance wait cap exceeded; restarting anyway");
        }
        self.maintenance_wait_since = None;

        if obs.pane_exists {
            self.pane
                .paste_and_enter(&self.cfg.session, &self.cfg.assistant_cmd)
                .await?;
            self.activity_log.append(now, "restarted assistant in existing pane");
        } else {
            self.pane
                .create_session(&self.cfg.session, &self.cfg.assistant_cwd, &self.cfg.assistant_cmd)
                .await?;
            self.activity_log.append(now, "created pane and started assistant");
        }
        tracing::warn!(session = %self.cfg.session, "assistant restarted");

        self.not_running_ticks = 0;
        self.grace_until = Some(now + self.cfg.restart_grace);
        self.pending_catch_up = true;
        Ok(true)
    }

    /// Request a stuck probe when the transcript has been silent too long
    /// even though work was delivered after its last write. One probe per
    /// quiescence episode.
    fn detect_stuck(&mut self, obs: &Observation, now: i64) -> Result<Option<i64>, EngineError> {
        if !obs.process_running {
            return Ok(None);
        }
        let Some(transcript_at) = obs.transcript_activity else {
            return Ok(None);
        };
        if now - transcript_at < self.cfg.stuck_after {
            self.stuck_probe_marker = None;
            return Ok(None);
        }
        let delivered = self.store.latest_delivery_at()?;
        if !delivered.is_some_and(|at| at > transcript_at) {
            return Ok(None);
        }
        if self.stuck_probe_marker == Some(transcript_at) {
            return Ok(None);
        }

        let reason = format!(
            "no transcript activity for {}s despite delivered work",
            now - transcript_at
        );
        let id = self.heartbeat.request_stuck_probe(&self.store, now, &reason)?;
        if id.is_some() {
            self.stuck_probe_marker = Some(transcript_at);
            self.activity_log.append(now, &format!("requested stuck probe: {reason}"));
        }
        Ok(id)
    }

    /// Send the recovery notice to every refused channel, then clear the
    /// list. Send failures are logged, not retried: the channel can reach
    /// back in on its own now that ingestion is open again.
    async fn notify_pending_channels(&self) {
        let entries = match self.pending.drain() {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(error = %e, "could not read pending-channels list");
                return;
            }
        };
        for entry in entries {
            if let Err(e) = self
                .sender
                .send(&entry.channel, entry.endpoint.as_deref(), &self.cfg.recovery_notice)
                .await
            {
                tracing::warn!(
                    channel = %entry.channel,
                    error = %e,
                    "recovery notification failed"
                );
            }
        }
    }
}

fn derive_state(obs: &Observation, now: i64, idle_threshold: i64) -> AssistantState {
    if !obs.pane_exists {
        AssistantState::Offline
    } else if !obs.process_running {
        AssistantState::Stopped
    } else {
        match obs.last_activity {
            Some(at) if now - at < idle_threshold => AssistantState::Busy,
            _ => AssistantState::Idle,
        }
    }
}

/// Newest mtime (unix seconds) across the files directly in `dir`.
fn newest_mtime(dir: &Path) -> Option<i64> {
    let entries = std::fs::read_dir(dir).ok()?;
    let mut newest: Option<i64> = None;
    for entry in entries.flatten() {
        let Ok(meta) = entry.metadata() else { continue };
        if !meta.is_file() {
            continue;
        }
        let Ok(modified) = meta.modified() else { continue };
        let Ok(unix) = modified.duration_since(std::time::UNIX_EPOCH) else {
            continue;
        };
        let secs = unix.as_secs() as i64;
        newest = Some(newest.map_or(secs, |n: i64| n.max(secs)));
    }
    newest
}

#[cfg(test)]
#[path = "guardian_tests.rs"]
mod tests;
