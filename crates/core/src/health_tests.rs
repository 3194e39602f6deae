// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    ok = { Health::Ok, "ok" },
    recovering = { Health::Recovering, "recovering" },
    down = { Health::Down, "down" },
    rate_limited = { Health::RateLimited, "rate_limited" },
)]
fn health_round_trips(health: Health, s: &str) {
    assert_eq!(health.as_str(), s);
    assert_eq!(Health::parse(s), Some(health));
    // serde uses the same spelling
    assert_eq!(serde_json::to_string(&health).unwrap(), format!("\"{s}\""));
}

#[parameterized(
    offline = { AssistantState::Offline, "offline", false },
    stopped = { AssistantState::Stopped, "stopped", false },
    busy = { AssistantState::Busy, "busy", true },
    idle = { AssistantState::Idle, "idle", true },
    rate_limited = { AssistantState::RateLimited, "rate-limited", false },
)]
fn assistant_state_round_trips(state: AssistantState, s: &str, alive: bool) {
    assert_eq!(state.as_str(), s);
    assert_eq!(AssistantState::parse(s), Some(state));
    assert_eq!(state.is_alive(), alive);
}

fn status(state: AssistantState, idle_seconds: i64) -> StatusFile {
    StatusFile {
        state,
        health: Health::Ok,
        idle_seconds,
        last_activity: 1_000,
        pid: None,
        updated_at: 1_010,
    }
}

#[test]
fn idle_gate_by_seconds() {
    assert!(!status(AssistantState::Busy, 4).is_idle());
    assert!(status(AssistantState::Busy, 5).is_idle());
}

#[test]
fn idle_gate_by_state() {
    // state == idle counts even if idle_seconds has not reached the gate
    assert!(status(AssistantState::Idle, 0).is_idle());
}

#[test]
fn status_file_json_shape() {
    let s = status(AssistantState::Idle, 12);
    let json = serde_json::to_value(&s).unwrap();
    assert_eq!(json["state"], "idle");
    assert_eq!(json["health"], "ok");
    assert_eq!(json["idle_seconds"], 12);
    // pid omitted when unknown
    assert!(json.get("pid").is_none());

    let parsed: StatusFile = serde_json::from_value(json).unwrap();
    assert_eq!(parsed.state, AssistantState::Idle);
}
