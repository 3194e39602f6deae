// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Checkpoint operations and derived conversation queries.

use crate::{Result, StorageError, Store};
use rusqlite::{params, OptionalExtension, Row};
use warden_core::{Checkpoint, Conversation};

const COLUMNS: &str = "id, start_conversation_id, end_conversation_id, summary, created_at";

fn from_row(row: &Row<'_>) -> rusqlite::Result<Checkpoint> {
    Ok(Checkpoint {
        id: row.get(0)?,
        start_conversation_id: row.get(1)?,
        end_conversation_id: row.get(2)?,
        summary: row.get(3)?,
        created_at: row.get(4)?,
    })
}

impl Store {
    /// Record that conversations up to `end_id` have been summarized.
    /// The range starts where the previous checkpoint ended.
    pub fn create_checkpoint(
        &self,
        end_id: i64,
        summary: Option<&str>,
        now: i64,
    ) -> Result<Checkpoint> {
        let start = match self.latest_checkpoint()? {
            Some(prev) => prev.end_conversation_id + 1,
            None => 1,
        };
        if end_id < start {
            return Err(StorageError::Invalid(format!(
                "end id {end_id} precedes checkpoint start {start}"
            )));
        }
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO checkpoints
                     (start_conversation_id, end_conversation_id, summary, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![start, end_id, summary, now],
            )?;
            let id = conn.last_insert_rowid();
            Ok(Checkpoint {
                id,
                start_conversation_id: start,
                end_conversation_id: end_id,
                summary: summary.map(str::to_string),
                created_at: now,
            })
        })
    }

    pub fn latest_checkpoint(&self) -> Result<Option<Checkpoint>> {
        self.with_conn(|conn| {
            Ok(conn
                .query_row(
                    &format!(
                        "SELECT {COLUMNS} FROM checkpoints
                         ORDER BY end_conversation_id DESC
                         LIMIT 1"
                    ),
                    [],
                    from_row,
                )
                .optional()?)
        })
    }

    /// Checkpoints newest first.
    pub fn list_checkpoints(&self, limit: usize) -> Result<Vec<Checkpoint>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM checkpoints ORDER BY id DESC LIMIT ?1"
            ))?;
            let rows = stmt
                .query_map(params![limit as i64], from_row)?
                .collect::<rusqlite::Result<_>>()?;
            Ok(rows)
        })
    }

    /// Conversations after the latest checkpoint, oldest first.
    pub fn unsummarized_conversations(&self, limit: Option<usize>) -> Result<Vec<Conversation>> {
        let after = self
            .latest_checkpoint()?
            .map(|c| c.end_conversation_id)
            .unwrap_or(0);
        self.conversations_after(after, limit)
    }

    pub fn unsummarized_count(&self) -> Result<i64> {
        let after = self
            .latest_checkpoint()?
            .map(|c| c.end_conversation_id)
            .unwrap_or(0);
        self.with_conn(|conn| {
            Ok(conn.query_row(
                "SELECT COUNT(*) FROM conversations WHERE id > ?1",
                params![after],
                |r| r.get(0),
            )?)
        })
    }
}
