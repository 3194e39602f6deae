// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use warden_storage::Store;

fn engine() -> HeartbeatEngine {
    HeartbeatEngine::new(HeartbeatConfig::default())
}

fn store() -> Store {
    Store::open_in_memory().unwrap()
}

#[test]
fn first_tick_enqueues_primary_probe() {
    let store = store();
    let engine = engine();

    let tick = engine.tick(&store, 10_000).unwrap();
    let (id, phase) = tick.enqueued.unwrap();
    assert_eq!(phase, HeartbeatPhase::Primary);

    let entry = store.control(id).unwrap();
    assert_eq!(entry.channel, "heartbeat:primary");
    assert!(!entry.bypass_state);
    assert_eq!(entry.ack_deadline_at, Some(10_000 + 180));
    // The placeholder was replaced so the assistant can name the id.
    assert!(entry.content.contains(&format!("--id {id}")));

    let state = store.supervisor_state().unwrap();
    assert_eq!(state.inflight_control_id, Some(id));
    assert_eq!(state.inflight_phase.as_deref(), Some("primary"));
}

#[test]
fn at_most_one_probe_in_flight() {
    let store = store();
    let engine = engine();

    let first = engine.tick(&store, 10_000).unwrap();
    assert!(first.enqueued.is_some());

    // Probe pending and within deadline: nothing new.
    let second = engine.tick(&store, 10_010).unwrap();
    assert!(second.enqueued.is_none());
    assert_eq!(second.health_after, Health::Ok);
}

#[test]
fn acked_probe_keeps_health_ok_and_resets_interval() {
    let store = store();
    let engine = engine();

    let (id, _) = engine.tick(&store, 10_000).unwrap().enqueued.unwrap();
    store.ack_control(id, 10_030).unwrap();

    let tick = engine.tick(&store, 10_060).unwrap();
    assert_eq!(tick.health_after, Health::Ok);
    assert!(tick.actions.is_empty());
    assert!(tick.enqueued.is_none());

    let state = store.supervisor_state().unwrap();
    assert_eq!(state.last_heartbeat_at, 10_060);
    assert!(state.inflight_control_id.is_none());

    // Next primary is not due until the interval elapses.
    assert!(engine.tick(&store, 10_060 + 7199).unwrap().enqueued.is_none());
    let next = engine.tick(&store, 10_060 + 7200).unwrap();
    assert_eq!(next.enqueued.unwrap().1, HeartbeatPhase::Primary);
}

#[test]
fn timed_out_primary_enters_recovery_and_kills() {
    let store = store();
    let engine = engine();

    engine.tick(&store, 10_000).unwrap();
    // Past the ack deadline.
    let tick = engine.tick(&store, 10_200).unwrap();
    assert_eq!(tick.health_before, Health::Ok);
    assert_eq!(tick.health_after, Health::Recovering);
    assert!(tick.actions.contains(&HealthAction::KillSession));

    let state = store.supervisor_state().unwrap();
    assert_eq!(state.fail_count, 1);
}

#[test]
fn recovery_probe_respects_backoff() {
    let store = store();
    let engine = engine();

    engine.tick(&store, 10_000).unwrap();
    engine.tick(&store, 10_200).unwrap(); // timeout -> recovering, fail 1

    // Backoff for fail_count 1 is 60s from the resolution tick.
    assert!(engine.tick(&store, 10_230).unwrap().enqueued.is_none());
    let tick = engine.tick(&store, 10_261).unwrap();
    let (id, phase) = tick.enqueued.unwrap();
    assert_eq!(phase, HeartbeatPhase::Recovery);
    assert!(store.control(id).unwrap().bypass_state);
}

#[test]
fn three_timeouts_reach_down_then_down_checks() {
    let store = store();
    let engine = engine();

    // Primary probe times out.
    engine.tick(&store, 0).unwrap();
    let t = engine.tick(&store, 200).unwrap();
    assert_eq!(t.health_after, Health::Recovering);

    // First recovery probe (backoff 60) times out.
    engine.tick(&store, 270).unwrap();
    let t = engine.tick(&store, 500).unwrap();
    assert_eq!(t.health_after, Health::Recovering);
    assert_eq!(store.supervisor_state().unwrap().fail_count, 2);

    // Second recovery probe (backoff 120) times out: down.
    engine.tick(&store, 630).unwrap();
    let t = engine.tick(&store, 900).unwrap();
    assert_eq!(t.health_after, Health::Down);
    assert!(t.actions.is_empty());

    // Down-check not due before the retry interval.
    assert!(engine.tick(&store, 900 + 1799).unwrap().enqueued.is_none());
    let t = engine.tick(&store, 900 + 1800).unwrap();
    assert_eq!(t.enqueued.unwrap().1, HeartbeatPhase::DownCheck);
}

#[test]
fn down_check_success_restores_ok() {
    let store = store();
    let engine = engine();

    // Drive to down.
    engine.tick(&store, 0).unwrap();
    engine.tick(&store, 200).unwrap();
    engine.tick(&store, 270).unwrap();
    engine.tick(&store, 500).unwrap();
    engine.tick(&store, 630).unwrap();
    engine.tick(&store, 900).unwrap();
    assert_eq!(store.health().unwrap(), Health::Down);

    let (id, _) = engine.tick(&store, 2700).unwrap().enqueued.unwrap();
    store.ack_control(id, 2710).unwrap();

    let tick = engine.tick(&store, 2720).unwrap();
    assert_eq!(tick.health_after, Health::Ok);
    assert!(tick.actions.contains(&HealthAction::NotifyPendingChannels));
    assert_eq!(store.supervisor_state().unwrap().fail_count, 0);
}

#[test]
fn stuck_probe_only_while_ok_and_unoccupied() {
    let store = store();
    let engine = engine();

    let id = engine
        .request_stuck_probe(&store, 100, "transcript stale for 300s")
        .unwrap()
        .unwrap();
    let entry = store.control(id).unwrap();
    assert_eq!(entry.channel, "heartbeat:stuck");
    assert!(entry.content.contains("transcript stale for 300s"));

    // A second request while one is in flight is refused.
    assert!(engine
        .request_stuck_probe(&store, 110, "again")
        .unwrap()
        .is_none());
}

#[test]
fn stuck_timeout_drives_recovery() {
    let store = store();
    let engine = engine();

    engine.request_stuck_probe(&store, 100, "hang").unwrap();
    let tick = engine.tick(&store, 400).unwrap();
    assert_eq!(tick.health_after, Health::Recovering);
    assert!(tick.actions.contains(&HealthAction::KillSession));
}

#[test]
fn rate_limit_signal_pauses_and_probes_at_reset() {
    let store = store();
    let engine = engine();

    let actions = engine.signal_rate_limit(&store, 1_000, Some(120)).unwrap();
    assert_eq!(actions, vec![HealthAction::RecordRateLimitReset(Some(1_120))]);
    assert_eq!(store.health().unwrap(), Health::RateLimited);

    // No probe before the reset hint.
    assert!(engine.tick(&store, 1_060).unwrap().enqueued.is_none());

    // At the reset time a rate-limit probe goes out (bypassing health).
    let (id, phase) = engine.tick(&store, 1_120).unwrap().enqueued.unwrap();
    assert_eq!(phase, HeartbeatPhase::RateLimitCheck);
    assert!(store.control(id).unwrap().bypass_state);

    store.ack_control(id, 1_130).unwrap();
    let tick = engine.tick(&store, 1_140).unwrap();
    assert_eq!(tick.health_after, Health::Ok);
    assert!(tick.actions.contains(&HealthAction::NotifyPendingChannels));
    assert!(store.supervisor_state().unwrap().rate_limit_reset_at.is_none());
}

#[test]
fn rate_limit_signal_clears_pending_primary_probe() {
    let store = store();
    let engine = engine();

    let (id, _) = engine.tick(&store, 1_000).unwrap().enqueued.unwrap();
    engine.signal_rate_limit(&store, 1_010, None).unwrap();

    // The pending primary probe was superseded, not left to time out.
    assert_eq!(
        store.control(id).unwrap().status,
        warden_core::ControlStatus::Failed
    );
    assert!(store.supervisor_state().unwrap().inflight_control_id.is_none());
}

#[test]
fn rate_limit_timeout_stays_rate_limited_without_kill() {
    let store = store();
    let engine = engine();

    engine.signal_rate_limit(&store, 1_000, Some(60)).unwrap();
    engine.tick(&store, 1_060).unwrap(); // probe out
    let tick = engine.tick(&store, 1_300).unwrap(); // past deadline
    assert_eq!(tick.health_after, Health::RateLimited);
    assert!(tick.actions.is_empty());
}
