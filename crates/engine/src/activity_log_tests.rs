// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn appends_timestamped_lines() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("activity.log");
    let mut log = ActivityLog::new(&path);

    log.append(0, "started");
    log.append(60, "state -> idle");

    let content = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], "[1970-01-01 00:00:00] started");
    assert!(lines[1].ends_with("state -> idle"));
}

#[test]
fn day_roll_truncates_to_tail() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("activity.log");
    let mut log = ActivityLog::new(&path).with_max_lines(3);

    for i in 0..10 {
        log.append(i, &format!("line {i}"));
    }
    assert_eq!(std::fs::read_to_string(&path).unwrap().lines().count(), 10);

    // First append of the next day truncates to the last 3 lines first.
    log.append(86_400, "new day");
    let content = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[0].ends_with("line 7"));
    assert!(lines[3].ends_with("new day"));
}

#[test]
fn truncation_skips_short_files() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("activity.log");
    let mut log = ActivityLog::new(&path).with_max_lines(100);

    log.append(0, "only line");
    log.append(86_400, "next day");
    assert_eq!(std::fs::read_to_string(&path).unwrap().lines().count(), 2);
}

#[test]
fn logging_failure_is_silent() {
    // Parent "directory" is actually a file: append must not panic.
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, b"").unwrap();
    let mut log = ActivityLog::new(blocker.join("activity.log"));
    log.append(0, "dropped");
}
