// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    pending = { ConversationStatus::Pending, "pending" },
    running = { ConversationStatus::Running, "running" },
    delivered = { ConversationStatus::Delivered, "delivered" },
    failed = { ConversationStatus::Failed, "failed" },
)]
fn status_round_trips_through_str(status: ConversationStatus, s: &str) {
    assert_eq!(status.as_str(), s);
    assert_eq!(ConversationStatus::parse(s), Some(status));
}

#[test]
fn unknown_status_does_not_parse() {
    assert_eq!(ConversationStatus::parse("bogus"), None);
}

#[parameterized(
    pending = { ConversationStatus::Pending, false },
    running = { ConversationStatus::Running, false },
    delivered = { ConversationStatus::Delivered, true },
    failed = { ConversationStatus::Failed, true },
)]
fn terminal_states(status: ConversationStatus, terminal: bool) {
    assert_eq!(status.is_terminal(), terminal);
}

#[test]
fn direction_round_trips() {
    assert_eq!(Direction::parse("in"), Some(Direction::In));
    assert_eq!(Direction::parse("out"), Some(Direction::Out));
    assert_eq!(Direction::parse(""), None);
    assert_eq!(Direction::In.to_string(), "in");
}

#[test]
fn new_message_builder_defaults() {
    let msg = NewMessage::new("tg", "hi");
    assert_eq!(msg.priority, PRIORITY_NORMAL);
    assert!(!msg.require_idle);
    assert!(msg.endpoint_id.is_none());

    let msg = NewMessage::new("tg", "hi")
        .endpoint("1")
        .priority(PRIORITY_URGENT)
        .require_idle(true);
    assert_eq!(msg.endpoint_id.as_deref(), Some("1"));
    assert_eq!(msg.priority, PRIORITY_URGENT);
    assert!(msg.require_idle);
}

#[test]
fn priority_levels_are_ordered() {
    assert!(PRIORITY_SYSTEM < PRIORITY_URGENT);
    assert!(PRIORITY_URGENT < PRIORITY_NORMAL);
}
