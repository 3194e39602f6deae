// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

fn task(kind: TaskKind) -> Task {
    Task {
        id: TaskId::new("t-1"),
        name: "morning brief".to_string(),
        prompt: "Summarize overnight messages".to_string(),
        kind,
        cron_expression: None,
        interval_seconds: None,
        timezone: None,
        next_run_at: 1_000,
        priority: 3,
        require_idle: false,
        miss_threshold: 600,
        reply_channel: None,
        reply_endpoint: None,
        status: TaskStatus::Pending,
        last_error: None,
        created_at: 900,
        updated_at: 900,
    }
}

#[parameterized(
    one_time = { TaskKind::OneTime, "one-time", false },
    recurring = { TaskKind::Recurring, "recurring", true },
    interval = { TaskKind::Interval, "interval", true },
)]
fn kind_str_and_repeating(kind: TaskKind, s: &str, repeating: bool) {
    assert_eq!(kind.as_str(), s);
    assert_eq!(TaskKind::parse(s), Some(kind));
    assert_eq!(kind.is_repeating(), repeating);
}

#[test]
fn status_round_trips_through_str() {
    for s in ["pending", "running", "completed", "failed", "paused"] {
        assert_eq!(TaskStatus::parse(s).unwrap().as_str(), s);
    }
    assert_eq!(TaskStatus::parse("zzz"), None);
}

#[test]
fn missed_window_boundary() {
    let t = task(TaskKind::OneTime);
    // due at 1000, threshold 600: still inside at exactly 1600
    assert!(!t.missed_window(1_600));
    assert!(t.missed_window(1_601));
}

#[test]
fn stale_running_detection() {
    let mut t = task(TaskKind::Interval);
    t.status = TaskStatus::Running;
    t.updated_at = 1_000;

    assert!(!t.is_stale_running(1_000 + TASK_RUNNING_TIMEOUT_SECS));
    assert!(t.is_stale_running(1_001 + TASK_RUNNING_TIMEOUT_SECS));

    // Only running tasks go stale.
    t.status = TaskStatus::Pending;
    assert!(!t.is_stale_running(i64::MAX));
}

#[test]
fn history_status_round_trips() {
    for s in ["started", "completed", "failed"] {
        assert_eq!(TaskHistoryStatus::parse(s).unwrap().as_str(), s);
    }
}

#[test]
fn kind_serde_uses_hyphenated_names() {
    let json = serde_json::to_string(&TaskKind::OneTime).unwrap();
    assert_eq!(json, "\"one-time\"");
    let parsed: TaskKind = serde_json::from_str("\"recurring\"").unwrap();
    assert_eq!(parsed, TaskKind::Recurring);
}
