// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn task_id_display() {
    let id = TaskId::new("task-42");
    assert_eq!(id.to_string(), "task-42");
    assert_eq!(id.as_str(), "task-42");
}

#[test]
fn task_id_from_str() {
    let id: TaskId = "abc".into();
    assert_eq!(id, "abc");
}

#[test]
fn task_id_serde() {
    let id = TaskId::new("my-task");
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, "\"my-task\"");

    let parsed: TaskId = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, id);
}

#[test]
fn short_truncates() {
    let id = TaskId::new("abcdefgh");
    assert_eq!(id.short(4), "abcd");
    assert_eq!(id.short(100), "abcdefgh");
}

#[test]
fn uuid_gen_produces_unique_ids() {
    let id_gen = UuidIdGen;
    let a = id_gen.next();
    let b = id_gen.next();
    assert_ne!(a, b);
    assert_eq!(a.len(), 36);
}
