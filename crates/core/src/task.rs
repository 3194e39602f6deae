// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scheduled task records.

use crate::id::TaskId;
use serde::{Deserialize, Serialize};

/// Timeout after which a `running` task with a stale `updated_at` is reaped.
pub const TASK_RUNNING_TIMEOUT_SECS: i64 = 3600;

/// Default miss window: an occurrence more than this many seconds overdue
/// at scheduling time is skipped.
pub const DEFAULT_MISS_THRESHOLD_SECS: i64 = 600;

/// What kind of schedule a task runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskKind {
    /// Fires once at `next_run_at`.
    #[serde(rename = "one-time")]
    OneTime,
    /// Fires on a cron expression in the task's timezone.
    #[serde(rename = "recurring")]
    Recurring,
    /// Fires every `interval_seconds`.
    #[serde(rename = "interval")]
    Interval,
}

impl TaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::OneTime => "one-time",
            TaskKind::Recurring => "recurring",
            TaskKind::Interval => "interval",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "one-time" => Some(TaskKind::OneTime),
            "recurring" => Some(TaskKind::Recurring),
            "interval" => Some(TaskKind::Interval),
            _ => None,
        }
    }

    pub fn is_repeating(&self) -> bool {
        matches!(self, TaskKind::Recurring | TaskKind::Interval)
    }
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Task lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Paused,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Running => "running",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
            TaskStatus::Paused => "paused",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(TaskStatus::Pending),
            "running" => Some(TaskStatus::Running),
            "completed" => Some(TaskStatus::Completed),
            "failed" => Some(TaskStatus::Failed),
            "paused" => Some(TaskStatus::Paused),
            _ => None,
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted task row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub name: String,
    /// Text delivered to the assistant when the task fires.
    pub prompt: String,
    pub kind: TaskKind,
    /// 5-field cron expression; set iff kind == Recurring.
    pub cron_expression: Option<String>,
    /// Fixed period; set iff kind == Interval.
    pub interval_seconds: Option<i64>,
    /// IANA zone for cron evaluation. Defaults to UTC when absent.
    pub timezone: Option<String>,
    pub next_run_at: i64,
    pub priority: i64,
    pub require_idle: bool,
    pub miss_threshold: i64,
    pub reply_channel: Option<String>,
    pub reply_endpoint: Option<String>,
    pub status: TaskStatus,
    pub last_error: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Task {
    /// Whether an occurrence due at `next_run_at` has fallen outside the
    /// task's miss window as of `now`.
    pub fn missed_window(&self, now: i64) -> bool {
        now - self.next_run_at > self.miss_threshold
    }

    /// Whether a `running` task has gone stale as of `now`.
    pub fn is_stale_running(&self, now: i64) -> bool {
        self.status == TaskStatus::Running
            && now - self.updated_at > TASK_RUNNING_TIMEOUT_SECS
    }
}

/// Terminal outcome of one dispatch attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskHistoryStatus {
    Started,
    Completed,
    Failed,
}

impl TaskHistoryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskHistoryStatus::Started => "started",
            TaskHistoryStatus::Completed => "completed",
            TaskHistoryStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "started" => Some(TaskHistoryStatus::Started),
            "completed" => Some(TaskHistoryStatus::Completed),
            "failed" => Some(TaskHistoryStatus::Failed),
            _ => None,
        }
    }
}

impl std::fmt::Display for TaskHistoryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the append-only dispatch history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskHistoryEntry {
    pub id: i64,
    pub task_id: TaskId,
    pub run_at: i64,
    pub status: TaskHistoryStatus,
    pub detail: Option<String>,
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
