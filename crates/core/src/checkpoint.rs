// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Checkpoint markers over the conversation history.
//!
//! A checkpoint records that the assistant has summarized the contiguous
//! conversation range `[start_conversation_id, end_conversation_id]` into
//! its memory. Session-start hooks only show conversations after the
//! latest checkpoint.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    pub id: i64,
    pub start_conversation_id: i64,
    pub end_conversation_id: i64,
    pub summary: Option<String>,
    pub created_at: i64,
}

impl Checkpoint {
    /// Whether a conversation id falls inside this checkpoint's range.
    pub fn covers(&self, conversation_id: i64) -> bool {
        conversation_id >= self.start_conversation_id
            && conversation_id <= self.end_conversation_id
    }
}
