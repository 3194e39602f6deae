// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use warden_core::{ConversationStatus, Direction, PRIORITY_NORMAL, PRIORITY_SYSTEM, PRIORITY_URGENT};

#[test]
fn insert_and_fetch_inbound() {
    let store = store();
    let id = store
        .insert_message(
            &NewMessage::new("tg", "hi").endpoint("1").priority(2),
            1_000,
        )
        .unwrap();

    let conv = store.conversation(id).unwrap();
    assert_eq!(conv.direction, Direction::In);
    assert_eq!(conv.channel, "tg");
    assert_eq!(conv.endpoint_id.as_deref(), Some("1"));
    assert_eq!(conv.status, ConversationStatus::Pending);
    assert_eq!(conv.priority, 2);
    assert_eq!(conv.retry_count, 0);
}

#[test]
fn outbound_rows_are_born_delivered() {
    let store = store();
    let id = store.insert_outbound("tg", Some("1"), "reply", 1_000).unwrap();
    let conv = store.conversation(id).unwrap();
    assert_eq!(conv.direction, Direction::Out);
    assert_eq!(conv.status, ConversationStatus::Delivered);
}

#[test]
fn ids_are_strictly_increasing() {
    let store = store();
    let a = store.insert_message(&NewMessage::new("tg", "1"), 1).unwrap();
    let b = store.insert_message(&NewMessage::new("tg", "2"), 1).unwrap();
    let c = store.insert_message(&NewMessage::new("tg", "3"), 1).unwrap();
    assert!(a < b && b < c);
}

#[test]
fn peek_orders_by_priority_then_insertion() {
    let store = store();
    store
        .insert_message(&NewMessage::new("tg", "normal").priority(PRIORITY_NORMAL), 10)
        .unwrap();
    let urgent = store
        .insert_message(&NewMessage::new("tg", "urgent").priority(PRIORITY_URGENT), 20)
        .unwrap();

    let best = store.peek_next_inbound(true).unwrap().unwrap();
    assert_eq!(best.id, urgent);
}

#[test]
fn same_priority_is_fifo() {
    let store = store();
    let first = store
        .insert_message(&NewMessage::new("tg", "first"), 10)
        .unwrap();
    store
        .insert_message(&NewMessage::new("tg", "second"), 10)
        .unwrap();

    let best = store.peek_next_inbound(true).unwrap().unwrap();
    assert_eq!(best.id, first);
}

#[test]
fn non_idle_peek_skips_priority_one_and_idle_required() {
    let store = store();
    store
        .insert_message(&NewMessage::new("system", "ctl").priority(PRIORITY_SYSTEM), 10)
        .unwrap();
    store
        .insert_message(
            &NewMessage::new("tg", "wait for idle")
                .priority(PRIORITY_NORMAL)
                .require_idle(true),
            11,
        )
        .unwrap();
    let normal = store
        .insert_message(&NewMessage::new("tg", "go").priority(PRIORITY_NORMAL), 12)
        .unwrap();

    // Busy: lower priorities overtake the gated entries.
    let best = store.peek_next_inbound(false).unwrap().unwrap();
    assert_eq!(best.id, normal);

    // Idle: the priority-1 entry wins again.
    let best = store.peek_next_inbound(true).unwrap().unwrap();
    assert_eq!(best.content, "ctl");
}

#[test]
fn claim_is_atomic() {
    let store = store();
    let id = store.insert_message(&NewMessage::new("tg", "hi"), 10).unwrap();

    assert!(store.claim_conversation(id).unwrap());
    // Second claim loses: the row is no longer pending.
    assert!(!store.claim_conversation(id).unwrap());
    assert_eq!(
        store.conversation(id).unwrap().status,
        ConversationStatus::Running
    );
}

#[test]
fn claimed_rows_are_invisible_to_peek() {
    let store = store();
    let id = store.insert_message(&NewMessage::new("tg", "hi"), 10).unwrap();
    store.claim_conversation(id).unwrap();
    assert!(store.peek_next_inbound(true).unwrap().is_none());
}

#[test]
fn release_increments_retry_count() {
    let store = store();
    let id = store.insert_message(&NewMessage::new("tg", "hi"), 10).unwrap();
    store.claim_conversation(id).unwrap();

    assert_eq!(store.release_conversation(id).unwrap(), 1);
    assert_eq!(
        store.conversation(id).unwrap().status,
        ConversationStatus::Pending
    );

    store.claim_conversation(id).unwrap();
    assert_eq!(store.release_conversation(id).unwrap(), 2);
}

#[test]
fn deliver_and_fail_are_terminal() {
    let store = store();
    let a = store.insert_message(&NewMessage::new("tg", "a"), 10).unwrap();
    let b = store.insert_message(&NewMessage::new("tg", "b"), 10).unwrap();

    store.claim_conversation(a).unwrap();
    store.mark_conversation_delivered(a).unwrap();
    store.fail_conversation(b).unwrap();

    assert_eq!(
        store.conversation(a).unwrap().status,
        ConversationStatus::Delivered
    );
    assert_eq!(
        store.conversation(b).unwrap().status,
        ConversationStatus::Failed
    );
    assert!(store.peek_next_inbound(true).unwrap().is_none());
}

#[test]
fn recent_conversations_come_back_oldest_first() {
    let store = store();
    for i in 0..5 {
        store
            .insert_message(&NewMessage::new("tg", format!("m{i}")), i)
            .unwrap();
    }
    let recent = store.recent_conversations(3).unwrap();
    assert_eq!(recent.len(), 3);
    assert_eq!(recent[0].content, "m2");
    assert_eq!(recent[2].content, "m4");
}

#[test]
fn conversations_after_filters_and_limits() {
    let store = store();
    for i in 0..5 {
        store
            .insert_message(&NewMessage::new("tg", format!("m{i}")), i)
            .unwrap();
    }
    let rows = store.conversations_after(2, None).unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].id, 3);

    let rows = store.conversations_after(0, Some(2)).unwrap();
    assert_eq!(rows.len(), 2);
}

#[test]
fn latest_delivery_tracks_delivered_inbound_only() {
    let store = store();
    assert_eq!(store.latest_delivery_at().unwrap(), None);

    let id = store.insert_message(&NewMessage::new("tg", "hi"), 500).unwrap();
    store.insert_outbound("tg", None, "out", 900).unwrap();
    assert_eq!(store.latest_delivery_at().unwrap(), None);

    store.claim_conversation(id).unwrap();
    store.mark_conversation_delivered(id).unwrap();
    assert_eq!(store.latest_delivery_at().unwrap(), Some(500));
}
