// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::AckOutcome;
use warden_core::{ControlStatus, CONTROL_ID_PLACEHOLDER};

#[test]
fn placeholder_is_replaced_with_own_id() {
    let store = store();
    let id = store
        .enqueue_control(
            &NewControl::new(
                "heartbeat:primary",
                format!("Reply with: warden ack-control --id {CONTROL_ID_PLACEHOLDER}"),
            ),
            100,
        )
        .unwrap();

    let entry = store.control(id).unwrap();
    assert!(!entry.content.contains(CONTROL_ID_PLACEHOLDER));
    assert!(entry.content.ends_with(&format!("--id {id}")));
}

#[test]
fn content_without_placeholder_is_untouched() {
    let store = store();
    let id = store
        .enqueue_control(&NewControl::new("system", "/context"), 100)
        .unwrap();
    assert_eq!(store.control(id).unwrap().content, "/context");
}

#[test]
fn ack_round_trip() {
    let store = store();
    let id = store
        .enqueue_control(&NewControl::new("system", "ping").ack_deadline_at(500), 100)
        .unwrap();
    store.claim_control(id).unwrap();

    assert_eq!(store.ack_control(id, 400).unwrap(), AckOutcome::Done);
    assert_eq!(store.control(id).unwrap().status, ControlStatus::Done);

    // Idempotent.
    assert_eq!(
        store.ack_control(id, 450).unwrap(),
        AckOutcome::AlreadyTerminal(ControlStatus::Done)
    );
}

#[test]
fn ack_past_deadline_becomes_timeout_not_done() {
    let store = store();
    let id = store
        .enqueue_control(&NewControl::new("system", "ping").ack_deadline_at(500), 100)
        .unwrap();

    assert_eq!(store.ack_control(id, 501).unwrap(), AckOutcome::Timeout);
    assert_eq!(store.control(id).unwrap().status, ControlStatus::Timeout);
}

#[test]
fn expire_converts_overdue_pending_and_running() {
    let store = store();
    let pending = store
        .enqueue_control(&NewControl::new("system", "a").ack_deadline_at(500), 100)
        .unwrap();
    let running = store
        .enqueue_control(&NewControl::new("system", "b").ack_deadline_at(500), 100)
        .unwrap();
    store.claim_control(running).unwrap();
    let alive = store
        .enqueue_control(&NewControl::new("system", "c").ack_deadline_at(900), 100)
        .unwrap();

    assert_eq!(store.expire_overdue_controls(600).unwrap(), 2);
    assert_eq!(store.control(pending).unwrap().status, ControlStatus::Timeout);
    assert_eq!(store.control(running).unwrap().status, ControlStatus::Timeout);
    assert_eq!(store.control(alive).unwrap().status, ControlStatus::Pending);
}

#[test]
fn peek_skips_unavailable_and_expired() {
    let store = store();
    store
        .enqueue_control(&NewControl::new("system", "later").available_at(1_000), 100)
        .unwrap();
    store
        .enqueue_control(&NewControl::new("system", "expired").ack_deadline_at(150), 100)
        .unwrap();
    let due = store
        .enqueue_control(&NewControl::new("system", "due"), 100)
        .unwrap();

    let best = store.peek_next_control(200, true, true).unwrap().unwrap();
    assert_eq!(best.id, due);

    // Once the delayed entry is available it wins on insertion order.
    let best = store.peek_next_control(1_000, true, true).unwrap().unwrap();
    assert_eq!(best.content, "later");
}

#[test]
fn peek_gates_on_health_unless_bypass() {
    let store = store();
    store
        .enqueue_control(&NewControl::new("system", "normal"), 100)
        .unwrap();
    let bypass = store
        .enqueue_control(&NewControl::new("heartbeat:recovery", "probe").bypass_state(true), 101)
        .unwrap();

    // Health not ok: only the bypass entry is deliverable.
    let best = store.peek_next_control(200, true, false).unwrap().unwrap();
    assert_eq!(best.id, bypass);

    // Health ok: insertion order decides again.
    let best = store.peek_next_control(200, true, true).unwrap().unwrap();
    assert_eq!(best.content, "normal");
}

#[test]
fn peek_applies_idle_gate() {
    let store = store();
    store
        .enqueue_control(&NewControl::new("system", "gated"), 100)
        .unwrap();
    let urgent = store
        .enqueue_control(&NewControl::new("system", "urgent").priority(2), 101)
        .unwrap();

    let best = store.peek_next_control(200, false, true).unwrap().unwrap();
    assert_eq!(best.id, urgent);
}

#[test]
fn claim_release_retry_cycle() {
    let store = store();
    let id = store
        .enqueue_control(&NewControl::new("system", "x"), 100)
        .unwrap();

    assert!(store.claim_control(id).unwrap());
    assert!(!store.claim_control(id).unwrap());

    assert_eq!(store.release_control(id, "paste failed").unwrap(), 1);
    let entry = store.control(id).unwrap();
    assert_eq!(entry.status, ControlStatus::Pending);
    assert_eq!(entry.last_error.as_deref(), Some("paste failed"));

    store.fail_control(id, "gave up").unwrap();
    assert_eq!(store.control(id).unwrap().status, ControlStatus::Failed);
}

#[test]
fn single_pending_heartbeat_visibility() {
    let store = store();
    assert!(store.pending_heartbeat().unwrap().is_none());

    let hb = store
        .enqueue_control(&NewControl::new("heartbeat:primary", "probe"), 100)
        .unwrap();
    // Non-heartbeat traffic does not count.
    store
        .enqueue_control(&NewControl::new("system", "other"), 101)
        .unwrap();

    let pending = store.pending_heartbeat().unwrap().unwrap();
    assert_eq!(pending.id, hb);

    assert_eq!(store.clear_pending_heartbeats("phase changed").unwrap(), 1);
    assert!(store.pending_heartbeat().unwrap().is_none());
    assert_eq!(store.control(hb).unwrap().status, ControlStatus::Failed);
}
