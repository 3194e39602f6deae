// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon configuration.
//!
//! Fixed paths under the state directory plus an optional
//! `settings.toml` for everything tunable. A settings file that does not
//! parse is a fatal startup error; a missing one means defaults.

use crate::lifecycle::LifecycleError;
use serde::Deserialize;
use std::path::PathBuf;

/// Tunable settings, loaded from `<state_dir>/settings.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Tmux session hosting the assistant.
    pub session: String,
    /// Command line that starts the assistant.
    pub assistant_cmd: String,
    /// Working directory for the assistant; defaults to the state dir.
    pub assistant_cwd: Option<PathBuf>,
    /// Process name checked against the pane's foreground process.
    pub process_pattern: String,
    /// Directory of per-session transcript files.
    pub transcript_dir: Option<PathBuf>,
    /// Directory of per-channel skills (`<skills>/<channel>/send`).
    pub skills_dir: Option<PathBuf>,
    /// Identity file referenced by session-init.
    pub identity_path: Option<PathBuf>,
    /// Reference files listed by session-init.
    pub reference_paths: Vec<PathBuf>,

    pub idle_threshold_secs: i64,
    pub restart_delay_secs: i64,
    pub restart_grace_secs: i64,
    pub stuck_after_secs: i64,
    pub maintenance_patterns: Vec<String>,
    pub maintenance_wait_cap_secs: i64,

    pub heartbeat_interval_secs: i64,
    pub heartbeat_ack_deadline_secs: i64,
    pub down_retry_interval_secs: i64,
    pub rate_limit_probe_interval_secs: i64,

    /// Unsummarized-row count that triggers the memory-sync nudge.
    pub session_init_sync_threshold: i64,

    pub catch_up_prompt: Option<String>,
    pub recovery_notice: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            session: "warden-main".to_string(),
            assistant_cmd: "claude".to_string(),
            assistant_cwd: None,
            process_pattern: "claude".to_string(),
            transcript_dir: None,
            skills_dir: None,
            identity_path: None,
            reference_paths: Vec::new(),
            idle_threshold_secs: 10,
            restart_delay_secs: 5,
            restart_grace_secs: 30,
            stuck_after_secs: 300,
            maintenance_patterns: vec![
                "warden-restart".to_string(),
                "warden-upgrade".to_string(),
                "warden-install".to_string(),
            ],
            maintenance_wait_cap_secs: 300,
            heartbeat_interval_secs: 7200,
            heartbeat_ack_deadline_secs: 180,
            down_retry_interval_secs: 1800,
            rate_limit_probe_interval_secs: 300,
            session_init_sync_threshold: 20,
            catch_up_prompt: None,
            recovery_notice: None,
        }
    }
}

/// Resolved configuration for one daemon process.
#[derive(Debug, Clone)]
pub struct Config {
    pub state_dir: PathBuf,
    pub db_path: PathBuf,
    pub status_path: PathBuf,
    pub pending_path: PathBuf,
    pub logs_dir: PathBuf,
    pub settings: Settings,
}

impl Config {
    /// Load configuration from the state directory.
    ///
    /// The state dir resolves from `$WARDEN_STATE_DIR`, then
    /// `$XDG_STATE_HOME/warden`, then `~/.local/state/warden`.
    pub fn load() -> Result<Self, LifecycleError> {
        let state_dir = state_dir()?;
        Self::load_from(state_dir)
    }

    pub fn load_from(state_dir: PathBuf) -> Result<Self, LifecycleError> {
        let settings_path = state_dir.join("settings.toml");
        let settings = match std::fs::read_to_string(&settings_path) {
            Ok(raw) => {
                toml::from_str(&raw).map_err(|e| LifecycleError::InvalidSettings {
                    path: settings_path.clone(),
                    reason: e.to_string(),
                })?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Settings::default(),
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            db_path: state_dir.join("warden.db"),
            status_path: state_dir.join("status.json"),
            pending_path: state_dir.join("pending-channels.jsonl"),
            logs_dir: state_dir.join("logs"),
            state_dir,
            settings,
        })
    }

    pub fn assistant_cwd(&self) -> PathBuf {
        self.settings
            .assistant_cwd
            .clone()
            .unwrap_or_else(|| self.state_dir.clone())
    }

    pub fn skills_dir(&self) -> PathBuf {
        self.settings
            .skills_dir
            .clone()
            .unwrap_or_else(|| self.state_dir.join("skills"))
    }

    pub fn activity_log_path(&self) -> PathBuf {
        self.logs_dir.join("guardian-activity.log")
    }

    pub fn catch_up_prompt(&self) -> String {
        self.settings.catch_up_prompt.clone().unwrap_or_else(|| {
            "You were restarted by the supervisor. Re-read your memory files, run \
             `warden session-init` to review conversations since the last sync, and \
             notify your owner on the usual channel that you are back."
                .to_string()
        })
    }

    pub fn recovery_notice(&self) -> String {
        self.settings
            .recovery_notice
            .clone()
            .unwrap_or_else(|| "The assistant is back online and accepting messages.".to_string())
    }
}

fn state_dir() -> Result<PathBuf, LifecycleError> {
    if let Ok(dir) = std::env::var("WARDEN_STATE_DIR") {
        if !dir.is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        if !xdg.is_empty() {
            return Ok(PathBuf::from(xdg).join("warden"));
        }
    }
    let home = std::env::var("HOME").map_err(|_| LifecycleError::NoStateDir)?;
    Ok(PathBuf::from(home).join(".local/state/warden"))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
