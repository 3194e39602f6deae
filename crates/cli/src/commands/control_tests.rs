// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use warden_core::{ControlStatus, Health, CONTROL_ID_PLACEHOLDER};

fn context() -> (Context, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let ctx = Context::open(Some(dir.path().to_path_buf()), false).unwrap();
    (ctx, dir)
}

fn enqueue_args(content: &str) -> EnqueueControlArgs {
    EnqueueControlArgs {
        content: content.to_string(),
        priority: 1,
        require_idle: false,
        bypass_state: false,
        ack_deadline: None,
        available_in: None,
        channel: "system".to_string(),
    }
}

#[test]
fn enqueue_persists_with_placeholder_substitution() {
    let (ctx, _dir) = context();
    let mut args = enqueue_args(&format!("ack {CONTROL_ID_PLACEHOLDER} please"));
    args.ack_deadline = Some(60);
    args.available_in = Some(10);
    args.bypass_state = true;
    enqueue(&ctx, &args).unwrap();

    let entry = ctx.store.control(1).unwrap();
    assert_eq!(entry.content, "ack 1 please");
    assert!(entry.bypass_state);
    assert!(entry.ack_deadline_at.is_some());
    assert!(entry.available_at.is_some());
}

#[test]
fn enqueue_rejects_bad_priority() {
    let (ctx, _dir) = context();
    let mut args = enqueue_args("x");
    args.priority = 0;
    assert!(enqueue(&ctx, &args).is_err());
}

#[test]
fn ack_round_trip_is_idempotent() {
    let (ctx, _dir) = context();
    enqueue(&ctx, &enqueue_args("ping")).unwrap();

    ack(&ctx, &AckControlArgs { id: 1 }).unwrap();
    assert_eq!(ctx.store.control(1).unwrap().status, ControlStatus::Done);
    // Second ack is a no-op, not an error.
    ack(&ctx, &AckControlArgs { id: 1 }).unwrap();
}

#[test]
fn ack_unknown_id_is_an_error() {
    let (ctx, _dir) = context();
    assert!(ack(&ctx, &AckControlArgs { id: 404 }).is_err());
}

#[test]
fn expired_entry_acks_as_timeout() {
    let (ctx, _dir) = context();
    let now = ctx.now();
    let ctl = warden_core::NewControl::new("system", "late").ack_deadline_at(now - 10);
    let id = ctx.store.enqueue_control(&ctl, now - 100).unwrap();

    ack(&ctx, &AckControlArgs { id }).unwrap();
    assert_eq!(ctx.store.control(id).unwrap().status, ControlStatus::Timeout);
}

#[test]
fn get_reports_effective_status() {
    let (ctx, _dir) = context();
    let now = ctx.now();
    let ctl = warden_core::NewControl::new("system", "late").ack_deadline_at(now - 10);
    let id = ctx.store.enqueue_control(&ctl, now - 100).unwrap();

    // Stored status is still pending; get() must not error and the
    // effective view is timeout.
    assert_eq!(ctx.store.control(id).unwrap().status, ControlStatus::Pending);
    get(&ctx, &GetControlArgs { id }).unwrap();
}

#[test]
fn rate_limit_signal_degrades_health() {
    let (ctx, _dir) = context();
    rate_limit(&ctx, &RateLimitArgs { reset_in: Some(120) }).unwrap();

    assert_eq!(ctx.store.health().unwrap(), Health::RateLimited);
    let state = ctx.store.supervisor_state().unwrap();
    assert!(state.rate_limit_reset_at.is_some());
}
