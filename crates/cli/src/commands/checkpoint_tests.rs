// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use warden_core::NewMessage;

fn context_with_messages(n: usize) -> (Context, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let ctx = Context::open(Some(dir.path().to_path_buf()), false).unwrap();
    for i in 0..n {
        ctx.store
            .insert_message(&NewMessage::new("tg", format!("m{i}")), i as i64)
            .unwrap();
    }
    (ctx, dir)
}

#[test]
fn create_and_latest() {
    let (ctx, _dir) = context_with_messages(5);
    create(&ctx, 3, Some("first three")).unwrap();

    let latest = ctx.store.latest_checkpoint().unwrap().unwrap();
    assert_eq!(latest.start_conversation_id, 1);
    assert_eq!(latest.end_conversation_id, 3);
    assert_eq!(latest.summary.as_deref(), Some("first three"));

    latest_cmd_works(&ctx);
}

fn latest_cmd_works(ctx: &Context) {
    latest(ctx).unwrap();
}

#[test]
fn create_rejects_future_end_id() {
    let (ctx, _dir) = context_with_messages(2);
    assert!(create(&ctx, 5, None).is_err());
}

#[test]
fn create_rejects_regression() {
    let (ctx, _dir) = context_with_messages(5);
    create(&ctx, 4, None).unwrap();
    assert!(create(&ctx, 2, None).is_err());
}

#[test]
fn latest_without_checkpoints_is_an_error() {
    let (ctx, _dir) = context_with_messages(0);
    assert!(latest(&ctx).is_err());
}

#[test]
fn list_is_ok_when_empty() {
    let (ctx, _dir) = context_with_messages(0);
    list(&ctx, 10).unwrap();
}
