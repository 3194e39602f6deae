// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use warden_core::NewMessage;

#[test]
fn renders_with_and_without_messages() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = Context::open(Some(dir.path().to_path_buf()), false).unwrap();

    handle(&ctx, &SessionInitArgs { threshold: None }).unwrap();

    for i in 0..3 {
        ctx.store
            .insert_message(&NewMessage::new("tg", format!("m{i}")), i)
            .unwrap();
    }
    handle(&ctx, &SessionInitArgs { threshold: Some(2) }).unwrap();
}
