// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use warden_core::Health;

#[test]
fn update_and_read_back() {
    let store = store();
    let mut state = store.supervisor_state().unwrap();
    state.health = Health::Recovering;
    state.fail_count = 2;
    state.inflight_control_id = Some(7);
    state.inflight_phase = Some("recovery".to_string());
    store.update_supervisor(&state, 1_234).unwrap();

    let read = store.supervisor_state().unwrap();
    assert_eq!(read.health, Health::Recovering);
    assert_eq!(read.fail_count, 2);
    assert_eq!(read.inflight_control_id, Some(7));
    assert_eq!(read.inflight_phase.as_deref(), Some("recovery"));
    assert_eq!(read.updated_at, 1_234);

    assert_eq!(store.health().unwrap(), Health::Recovering);
}

#[test]
fn rate_limit_reset_round_trip() {
    let store = store();
    let mut state = store.supervisor_state().unwrap();
    state.health = Health::RateLimited;
    state.rate_limit_reset_at = Some(9_999);
    store.update_supervisor(&state, 1).unwrap();

    let read = store.supervisor_state().unwrap();
    assert_eq!(read.rate_limit_reset_at, Some(9_999));

    state = read;
    state.health = Health::Ok;
    state.rate_limit_reset_at = None;
    store.update_supervisor(&state, 2).unwrap();
    assert!(store.supervisor_state().unwrap().rate_limit_reset_at.is_none());
}
