// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use warden_core::{AssistantState, Health};

fn sample() -> StatusFile {
    StatusFile {
        state: AssistantState::Idle,
        health: Health::Ok,
        idle_seconds: 42,
        last_activity: 1_000,
        pid: Some(99),
        updated_at: 1_042,
    }
}

#[test]
fn write_read_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("status.json");

    write_status(&path, &sample()).unwrap();
    let read = read_status(&path).unwrap();
    assert_eq!(read.state, AssistantState::Idle);
    assert_eq!(read.idle_seconds, 42);
    assert_eq!(read.pid, Some(99));

    // No temp file left behind.
    assert!(!path.with_extension("tmp").exists());
}

#[test]
fn missing_file_fails_open() {
    assert!(read_status(std::path::Path::new("/nonexistent/status.json")).is_none());
}

#[test]
fn malformed_file_fails_open() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("status.json");
    std::fs::write(&path, "{not json").unwrap();
    assert!(read_status(&path).is_none());
}

#[test]
fn overwrite_replaces_content() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("status.json");

    write_status(&path, &sample()).unwrap();
    let mut updated = sample();
    updated.state = AssistantState::Busy;
    updated.idle_seconds = 0;
    write_status(&path, &updated).unwrap();

    let read = read_status(&path).unwrap();
    assert_eq!(read.state, AssistantState::Busy);
    assert_eq!(read.idle_seconds, 0);
}

#[test]
fn creates_parent_directories() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("a").join("b").join("status.json");
    write_status(&path, &sample()).unwrap();
    assert!(read_status(&path).is_some());
}
