// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test]
async fn live_session_round_trip() {
    let pane = FakePane::with_live_session("main");
    assert!(pane.has_session("main").await.unwrap());
    assert!(!pane.has_session("other").await.unwrap());

    pane.paste_and_enter("main", "hello").await.unwrap();
    assert_eq!(pane.pastes(), vec!["hello".to_string()]);
}

#[tokio::test]
async fn paste_into_missing_session_fails() {
    let pane = FakePane::new();
    let err = pane.paste_and_enter("main", "x").await.unwrap_err();
    assert!(matches!(err, PaneError::NotFound(_)));
    assert!(pane.pastes().is_empty());
}

#[tokio::test]
async fn forced_paste_failure_and_recovery() {
    let pane = FakePane::with_live_session("main");
    pane.fail_pastes("tmux gone");

    let err = pane.paste_and_enter("main", "x").await.unwrap_err();
    assert!(matches!(err, PaneError::CommandFailed(_)));

    pane.allow_pastes();
    pane.paste_and_enter("main", "x").await.unwrap();
    assert_eq!(pane.pastes().len(), 1);
}

#[tokio::test]
async fn kill_is_idempotent_and_counted() {
    let pane = FakePane::with_live_session("main");
    pane.kill_session("main").await.unwrap();
    pane.kill_session("main").await.unwrap();
    assert_eq!(pane.kill_count(), 2);
    assert!(!pane.has_session("main").await.unwrap());
}

#[tokio::test]
async fn process_and_activity_observations() {
    let pane = FakePane::with_live_session("main");
    assert!(pane
        .foreground_process_matches("main", "claude")
        .await
        .unwrap());

    pane.set_process_running(false);
    assert!(!pane
        .foreground_process_matches("main", "claude")
        .await
        .unwrap());

    assert_eq!(pane.pane_activity_time("main").await.unwrap(), None);
    pane.set_activity_time(1_234);
    assert_eq!(pane.pane_activity_time("main").await.unwrap(), Some(1_234));
}

#[tokio::test]
async fn create_session_replaces_dead_session() {
    let pane = FakePane::new();
    pane.create_session("main", Path::new("/tmp"), "claude")
        .await
        .unwrap();
    assert!(pane.has_session("main").await.unwrap());

    let calls = pane.calls();
    assert!(matches!(calls[1], PaneCall::CreateSession { .. } | PaneCall::HasSession { .. }));
}
