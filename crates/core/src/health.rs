// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Health and assistant-state types, plus the status file shape.
//!
//! The guardian derives [`AssistantState`] from pane observations each
//! tick and broadcasts it (with the supervision [`Health`]) through the
//! status file. Everyone else treats the file as read-only and fails open.

use serde::{Deserialize, Serialize};

/// Idle gate: priority-1 delivery requires at least this many seconds of
/// observed idleness.
pub const IDLE_GATE_SECS: i64 = 5;

/// Supervision health state, owned by the heartbeat engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Health {
    Ok,
    Recovering,
    Down,
    RateLimited,
}

impl Health {
    pub fn as_str(&self) -> &'static str {
        match self {
            Health::Ok => "ok",
            Health::Recovering => "recovering",
            Health::Down => "down",
            Health::RateLimited => "rate_limited",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ok" => Some(Health::Ok),
            "recovering" => Some(Health::Recovering),
            "down" => Some(Health::Down),
            "rate_limited" => Some(Health::RateLimited),
            _ => None,
        }
    }
}

impl std::fmt::Display for Health {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Observable assistant state, derived by the guardian each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AssistantState {
    /// Pane absent.
    Offline,
    /// Pane present, assistant process absent.
    Stopped,
    /// Process present and recently active.
    Busy,
    /// Process present, no recent activity.
    Idle,
    /// Health is rate-limited; delivery paused.
    RateLimited,
}

impl AssistantState {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssistantState::Offline => "offline",
            AssistantState::Stopped => "stopped",
            AssistantState::Busy => "busy",
            AssistantState::Idle => "idle",
            AssistantState::RateLimited => "rate-limited",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "offline" => Some(AssistantState::Offline),
            "stopped" => Some(AssistantState::Stopped),
            "busy" => Some(AssistantState::Busy),
            "idle" => Some(AssistantState::Idle),
            "rate-limited" => Some(AssistantState::RateLimited),
            _ => None,
        }
    }

    /// Whether the assistant process is up at all (pane + process).
    pub fn is_alive(&self) -> bool {
        matches!(self, AssistantState::Busy | AssistantState::Idle)
    }
}

impl std::fmt::Display for AssistantState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The status file written atomically by the guardian every tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusFile {
    pub state: AssistantState,
    pub health: Health,
    /// Seconds since the last observed assistant activity.
    pub idle_seconds: i64,
    /// Unix seconds of the last observed assistant activity.
    pub last_activity: i64,
    /// Pane process id, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
    /// Unix seconds at which this file was written.
    pub updated_at: i64,
}

impl StatusFile {
    /// Idle-gate check used by the dispatcher for priority-1 delivery.
    pub fn is_idle(&self) -> bool {
        self.idle_seconds >= IDLE_GATE_SECS || self.state == AssistantState::Idle
    }
}

#[cfg(test)]
#[path = "health_tests.rs"]
mod tests;
