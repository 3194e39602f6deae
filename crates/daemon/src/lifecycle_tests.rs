// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn role_parse_round_trip() {
    for role in [Role::Guardian, Role::Dispatcher, Role::Scheduler] {
        assert_eq!(Role::parse(role.as_str()), Some(role));
    }
    assert_eq!(Role::parse("launcher"), None);
}

#[test]
fn lock_is_exclusive_per_role() {
    let dir = tempfile::tempdir().unwrap();

    let lock = acquire_lock(dir.path(), Role::Guardian).unwrap();
    assert!(lock.path.ends_with("guardian.pid"));

    // Same role cannot be acquired twice.
    assert!(matches!(
        acquire_lock(dir.path(), Role::Guardian),
        Err(LifecycleError::LockFailed { .. })
    ));

    // A different role can.
    acquire_lock(dir.path(), Role::Dispatcher).unwrap();
}

#[test]
fn lock_file_records_pid() {
    let dir = tempfile::tempdir().unwrap();
    let lock = acquire_lock(dir.path(), Role::Scheduler).unwrap();

    let recorded = std::fs::read_to_string(&lock.path).unwrap();
    assert_eq!(recorded.trim(), std::process::id().to_string());
}

#[test]
fn lock_releases_on_drop() {
    let dir = tempfile::tempdir().unwrap();
    drop(acquire_lock(dir.path(), Role::Guardian).unwrap());
    acquire_lock(dir.path(), Role::Guardian).unwrap();
}

#[test]
fn small_logs_are_not_rotated() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("guardian.log");
    std::fs::write(&log, b"little").unwrap();

    rotate_log_if_needed(&log);
    assert!(log.exists());
    assert!(!dir.path().join("guardian.log.1").exists());
}

#[test]
fn oversized_log_shifts_rotations() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("guardian.log");
    std::fs::write(&log, vec![b'x'; 11 * 1024 * 1024]).unwrap();
    std::fs::write(dir.path().join("guardian.log.1"), b"old-1").unwrap();

    rotate_log_if_needed(&log);
    assert!(!log.exists());
    assert!(dir.path().join("guardian.log.1").exists());
    assert_eq!(
        std::fs::read_to_string(dir.path().join("guardian.log.2")).unwrap(),
        "old-1"
    );
}

#[test]
fn startup_marker_appends() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("logs").join("dispatcher.log");

    write_startup_marker(&log, Role::Dispatcher).unwrap();
    let content = std::fs::read_to_string(&log).unwrap();
    assert!(content.starts_with(STARTUP_MARKER_PREFIX));
    assert!(content.contains("role: dispatcher"));
}
