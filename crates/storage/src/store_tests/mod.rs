// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::Store;
use warden_core::{NewControl, NewMessage, Task, TaskId, TaskKind, TaskStatus};

mod checkpoints;
mod controls;
mod conversations;
mod supervisor;
mod tasks;

fn store() -> Store {
    Store::open_in_memory().unwrap()
}

fn sample_task(id: &str, kind: TaskKind, next_run_at: i64) -> Task {
    Task {
        id: TaskId::new(id),
        name: format!("task {id}"),
        prompt: "do the thing".to_string(),
        kind,
        cron_expression: match kind {
            TaskKind::Recurring => Some("0 9 * * *".to_string()),
            _ => None,
        },
        interval_seconds: match kind {
            TaskKind::Interval => Some(3600),
            _ => None,
        },
        timezone: None,
        next_run_at,
        priority: 3,
        require_idle: false,
        miss_threshold: 600,
        reply_channel: None,
        reply_endpoint: None,
        status: TaskStatus::Pending,
        last_error: None,
        created_at: 0,
        updated_at: 0,
    }
}

#[test]
fn open_on_disk_creates_parent_dirs_and_migrates() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("warden.db");
    let store = Store::open(&path).unwrap();
    assert_eq!(store.schema_version().unwrap(), 1);
    assert!(path.exists());
}

#[test]
fn reopening_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("warden.db");
    {
        let store = Store::open(&path).unwrap();
        store
            .insert_message(&NewMessage::new("tg", "hello"), 100)
            .unwrap();
    }
    let store = Store::open(&path).unwrap();
    assert_eq!(store.schema_version().unwrap(), 1);
    assert_eq!(store.recent_conversations(10).unwrap().len(), 1);
}

#[test]
fn supervisor_row_is_seeded() {
    let store = store();
    let state = store.supervisor_state().unwrap();
    assert_eq!(state.health, warden_core::Health::Ok);
    assert_eq!(state.fail_count, 0);
}

#[test]
fn control_and_message_ids_are_independent_sequences() {
    let store = store();
    let m1 = store
        .insert_message(&NewMessage::new("tg", "a"), 1)
        .unwrap();
    let c1 = store
        .enqueue_control(&NewControl::new("system", "x"), 1)
        .unwrap();
    let m2 = store
        .insert_message(&NewMessage::new("tg", "b"), 2)
        .unwrap();
    assert_eq!(m1, 1);
    assert_eq!(c1, 1);
    assert_eq!(m2, 2);
}
