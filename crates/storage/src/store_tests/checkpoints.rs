// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::StorageError;

fn seed_messages(store: &Store, n: usize) {
    for i in 0..n {
        store
            .insert_message(&NewMessage::new("tg", format!("m{i}")), i as i64)
            .unwrap();
    }
}

#[test]
fn first_checkpoint_starts_at_one() {
    let store = store();
    seed_messages(&store, 5);

    let cp = store.create_checkpoint(5, Some("first five"), 100).unwrap();
    assert_eq!(cp.start_conversation_id, 1);
    assert_eq!(cp.end_conversation_id, 5);
    assert!(cp.covers(3));
    assert!(!cp.covers(6));
}

#[test]
fn ranges_chain_contiguously() {
    let store = store();
    seed_messages(&store, 10);

    store.create_checkpoint(4, None, 100).unwrap();
    let cp = store.create_checkpoint(9, None, 200).unwrap();
    assert_eq!(cp.start_conversation_id, 5);
    assert_eq!(cp.end_conversation_id, 9);
}

#[test]
fn end_before_start_is_rejected() {
    let store = store();
    seed_messages(&store, 5);
    store.create_checkpoint(4, None, 100).unwrap();

    let err = store.create_checkpoint(3, None, 200).unwrap_err();
    assert!(matches!(err, StorageError::Invalid(_)));
}

#[test]
fn latest_picks_highest_end() {
    let store = store();
    seed_messages(&store, 10);
    store.create_checkpoint(4, None, 100).unwrap();
    store.create_checkpoint(8, None, 200).unwrap();

    let latest = store.latest_checkpoint().unwrap().unwrap();
    assert_eq!(latest.end_conversation_id, 8);
}

#[test]
fn list_is_newest_first_and_limited() {
    let store = store();
    seed_messages(&store, 10);
    store.create_checkpoint(2, None, 100).unwrap();
    store.create_checkpoint(5, None, 200).unwrap();
    store.create_checkpoint(9, None, 300).unwrap();

    let list = store.list_checkpoints(2).unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0].end_conversation_id, 9);
}

#[test]
fn unsummarized_follows_latest_checkpoint() {
    let store = store();
    seed_messages(&store, 6);

    // No checkpoint: everything is unsummarized.
    assert_eq!(store.unsummarized_count().unwrap(), 6);

    store.create_checkpoint(4, None, 100).unwrap();
    assert_eq!(store.unsummarized_count().unwrap(), 2);

    let rows = store.unsummarized_conversations(None).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].id, 5);
}
