// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Control queue entries.
//!
//! Controls are the supervision sibling of conversations: heartbeat
//! probes, maintenance instructions, and any other traffic that must be
//! acknowledged by the assistant (or expire trying).

use serde::{Deserialize, Serialize};

/// Literal marker replaced with the entry's own id at insert time, so a
/// delivered acking instruction can name the id it must ack.
pub const CONTROL_ID_PLACEHOLDER: &str = "__CONTROL_ID__";

/// Status of a control entry. `done` and `timeout` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlStatus {
    Pending,
    Running,
    Done,
    Timeout,
    Failed,
}

impl ControlStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ControlStatus::Pending => "pending",
            ControlStatus::Running => "running",
            ControlStatus::Done => "done",
            ControlStatus::Timeout => "timeout",
            ControlStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ControlStatus::Pending),
            "running" => Some(ControlStatus::Running),
            "done" => Some(ControlStatus::Done),
            "timeout" => Some(ControlStatus::Timeout),
            "failed" => Some(ControlStatus::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ControlStatus::Done | ControlStatus::Timeout | ControlStatus::Failed
        )
    }
}

impl std::fmt::Display for ControlStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted control entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlEntry {
    pub id: i64,
    /// Unix seconds at creation.
    pub timestamp: i64,
    /// Originator label (`system`, `heartbeat:<phase>`, ...).
    pub channel: String,
    pub content: String,
    pub status: ControlStatus,
    pub priority: i64,
    pub require_idle: bool,
    pub retry_count: i64,
    /// Must be acknowledged by this time or the entry is timed out.
    pub ack_deadline_at: Option<i64>,
    /// Earliest delivery time for delayed enqueue.
    pub available_at: Option<i64>,
    /// Deliver regardless of current health state.
    pub bypass_state: bool,
    pub last_error: Option<String>,
}

impl ControlEntry {
    /// Status as observed at `now`: a non-terminal entry past its ack
    /// deadline reads as `timeout` even before the reaper converts it.
    pub fn effective_status(&self, now: i64) -> ControlStatus {
        if !self.status.is_terminal() && self.deadline_passed(now) {
            ControlStatus::Timeout
        } else {
            self.status
        }
    }

    pub fn deadline_passed(&self, now: i64) -> bool {
        self.ack_deadline_at.is_some_and(|d| d < now)
    }

    /// Whether the entry may be delivered yet.
    pub fn is_available(&self, now: i64) -> bool {
        self.available_at.is_none_or(|t| t <= now)
    }
}

/// Fields for enqueuing a new control entry.
#[derive(Debug, Clone)]
pub struct NewControl {
    pub channel: String,
    pub content: String,
    pub priority: i64,
    pub require_idle: bool,
    pub bypass_state: bool,
    pub ack_deadline_at: Option<i64>,
    pub available_at: Option<i64>,
}

impl NewControl {
    pub fn new(channel: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            content: content.into(),
            priority: crate::conversation::PRIORITY_SYSTEM,
            require_idle: false,
            bypass_state: false,
            ack_deadline_at: None,
            available_at: None,
        }
    }

    pub fn priority(mut self, priority: i64) -> Self {
        self.priority = priority;
        self
    }

    pub fn require_idle(mut self, require_idle: bool) -> Self {
        self.require_idle = require_idle;
        self
    }

    pub fn bypass_state(mut self, bypass: bool) -> Self {
        self.bypass_state = bypass;
        self
    }

    pub fn ack_deadline_at(mut self, deadline: i64) -> Self {
        self.ack_deadline_at = Some(deadline);
        self
    }

    pub fn available_at(mut self, at: i64) -> Self {
        self.available_at = Some(at);
        self
    }
}

#[cfg(test)]
#[path = "control_tests.rs"]
mod tests;
