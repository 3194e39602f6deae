// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Conversation queue entries.
//!
//! A conversation row is one message flowing between an external channel
//! and the assistant pane. Inbound rows (`direction = in`) are drained by
//! the dispatcher; outbound rows are a delivery record for `send`.

use serde::{Deserialize, Serialize};

/// Priority for system traffic. Delivery is idle-gated.
pub const PRIORITY_SYSTEM: i64 = 1;
/// Priority for urgent user traffic.
pub const PRIORITY_URGENT: i64 = 2;
/// Priority for normal user traffic.
pub const PRIORITY_NORMAL: i64 = 3;

/// Message flow direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    In,
    Out,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::In => "in",
            Direction::Out => "out",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "in" => Some(Direction::In),
            "out" => Some(Direction::Out),
            _ => None,
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of a conversation entry through its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationStatus {
    Pending,
    Running,
    Delivered,
    Failed,
}

impl ConversationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationStatus::Pending => "pending",
            ConversationStatus::Running => "running",
            ConversationStatus::Delivered => "delivered",
            ConversationStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ConversationStatus::Pending),
            "running" => Some(ConversationStatus::Running),
            "delivered" => Some(ConversationStatus::Delivered),
            "failed" => Some(ConversationStatus::Failed),
            _ => None,
        }
    }

    /// Terminal states are never re-claimed.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ConversationStatus::Delivered | ConversationStatus::Failed
        )
    }
}

impl std::fmt::Display for ConversationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted conversation entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    /// Monotonic rowid; conversation ordering.
    pub id: i64,
    /// Unix seconds at creation.
    pub timestamp: i64,
    pub direction: Direction,
    /// Logical source/target (adapter id, `scheduler`, `system`).
    pub channel: String,
    /// Opaque per-channel addressee.
    pub endpoint_id: Option<String>,
    pub content: String,
    pub status: ConversationStatus,
    /// Lower number = higher priority.
    pub priority: i64,
    /// Deliver only when the assistant has been idle for >= 5 s.
    pub require_idle: bool,
    pub retry_count: i64,
}

/// Fields for inserting a new inbound message.
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub channel: String,
    pub endpoint_id: Option<String>,
    pub content: String,
    pub priority: i64,
    pub require_idle: bool,
}

impl NewMessage {
    pub fn new(channel: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            endpoint_id: None,
            content: content.into(),
            priority: PRIORITY_NORMAL,
            require_idle: false,
        }
    }

    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint_id = Some(endpoint.into());
        self
    }

    pub fn priority(mut self, priority: i64) -> Self {
        self.priority = priority;
        self
    }

    pub fn require_idle(mut self, require_idle: bool) -> Self {
        self.require_idle = require_idle;
        self
    }
}

#[cfg(test)]
#[path = "conversation_tests.rs"]
mod tests;
