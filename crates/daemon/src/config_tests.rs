// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serial_test::serial;

#[test]
fn defaults_without_settings_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::load_from(dir.path().to_path_buf()).unwrap();

    assert_eq!(config.settings.session, "warden-main");
    assert_eq!(config.settings.restart_delay_secs, 5);
    assert_eq!(config.settings.heartbeat_interval_secs, 7200);
    assert_eq!(config.db_path, dir.path().join("warden.db"));
    assert_eq!(config.status_path, dir.path().join("status.json"));
    assert_eq!(config.skills_dir(), dir.path().join("skills"));
    assert_eq!(config.assistant_cwd(), dir.path());
}

#[test]
fn settings_file_overrides_defaults() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("settings.toml"),
        r#"
session = "agent-pane"
assistant_cmd = "claude --resume"
idle_threshold_secs = 15
reference_paths = ["/opt/agent/notes.md"]
"#,
    )
    .unwrap();

    let config = Config::load_from(dir.path().to_path_buf()).unwrap();
    assert_eq!(config.settings.session, "agent-pane");
    assert_eq!(config.settings.assistant_cmd, "claude --resume");
    assert_eq!(config.settings.idle_threshold_secs, 15);
    assert_eq!(config.settings.reference_paths.len(), 1);
    // Untouched fields keep their defaults.
    assert_eq!(config.settings.restart_grace_secs, 30);
}

#[test]
fn malformed_settings_are_fatal() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("settings.toml"), "session = [not toml").unwrap();

    let err = Config::load_from(dir.path().to_path_buf()).unwrap_err();
    assert!(matches!(err, LifecycleError::InvalidSettings { .. }));
}

#[test]
fn unknown_settings_keys_are_fatal() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("settings.toml"), "typo_key = 1\n").unwrap();

    assert!(matches!(
        Config::load_from(dir.path().to_path_buf()),
        Err(LifecycleError::InvalidSettings { .. })
    ));
}

#[test]
#[serial]
fn state_dir_prefers_explicit_env() {
    std::env::set_var("WARDEN_STATE_DIR", "/tmp/warden-test-state");
    let config = Config::load();
    std::env::remove_var("WARDEN_STATE_DIR");

    let config = config.unwrap();
    assert_eq!(config.state_dir, PathBuf::from("/tmp/warden-test-state"));
}
