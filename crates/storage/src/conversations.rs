// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Conversation queue operations.

use crate::error::parse_column;
use crate::{Result, StorageError, Store};
use rusqlite::{params, OptionalExtension, Row};
use warden_core::{Conversation, ConversationStatus, Direction, NewMessage};

const COLUMNS: &str = "id, timestamp, direction, channel, endpoint_id, content, status, \
                       priority, require_idle, retry_count";

fn from_row(row: &Row<'_>) -> rusqlite::Result<Conversation> {
    Ok(Conversation {
        id: row.get(0)?,
        timestamp: row.get(1)?,
        direction: parse_column(2, "direction", row.get(2)?, Direction::parse)?,
        channel: row.get(3)?,
        endpoint_id: row.get(4)?,
        content: row.get(5)?,
        status: parse_column(6, "conversation status", row.get(6)?, ConversationStatus::parse)?,
        priority: row.get(7)?,
        require_idle: row.get(8)?,
        retry_count: row.get(9)?,
    })
}

impl Store {
    /// Persist a new inbound message as `pending`.
    pub fn insert_message(&self, msg: &NewMessage, now: i64) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO conversations
                     (timestamp, direction, channel, endpoint_id, content, status,
                      priority, require_idle)
                 VALUES (?1, 'in', ?2, ?3, ?4, 'pending', ?5, ?6)",
                params![
                    now,
                    msg.channel,
                    msg.endpoint_id,
                    msg.content,
                    msg.priority,
                    msg.require_idle,
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// Record an outbound message. Outbound rows are a delivery record,
    /// created directly in `delivered`.
    pub fn insert_outbound(
        &self,
        channel: &str,
        endpoint_id: Option<&str>,
        content: &str,
        now: i64,
    ) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO conversations
                     (timestamp, direction, channel, endpoint_id, content, status, priority)
                 VALUES (?1, 'out', ?2, ?3, ?4, 'delivered', 3)",
                params![now, channel, endpoint_id, content],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn conversation(&self, id: i64) -> Result<Conversation> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT {COLUMNS} FROM conversations WHERE id = ?1"),
                params![id],
                from_row,
            )
            .optional()?
            .ok_or_else(|| StorageError::NotFound(format!("conversation {id}")))
        })
    }

    /// Best deliverable inbound candidate without claiming it.
    ///
    /// When the assistant is not idle, priority-1 and idle-required rows
    /// are excluded so lower priorities may overtake.
    pub fn peek_next_inbound(&self, idle: bool) -> Result<Option<Conversation>> {
        let gate = if idle {
            ""
        } else {
            "AND priority > 1 AND require_idle = 0"
        };
        self.with_conn(|conn| {
            Ok(conn
                .query_row(
                    &format!(
                        "SELECT {COLUMNS} FROM conversations
                         WHERE direction = 'in' AND status = 'pending' {gate}
                         ORDER BY priority, timestamp, id
                         LIMIT 1"
                    ),
                    [],
                    from_row,
                )
                .optional()?)
        })
    }

    /// Atomically claim a pending conversation. Returns false when another
    /// dispatcher won the race.
    pub fn claim_conversation(&self, id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE conversations SET status = 'running'
                 WHERE id = ?1 AND status = 'pending'",
                params![id],
            )?;
            Ok(changed == 1)
        })
    }

    pub fn mark_conversation_delivered(&self, id: i64) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE conversations SET status = 'delivered' WHERE id = ?1",
                params![id],
            )?;
            Ok(())
        })
    }

    /// Revert a claimed conversation to `pending` after a transport
    /// failure. Returns the new retry count.
    pub fn release_conversation(&self, id: i64) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE conversations
                 SET status = 'pending', retry_count = retry_count + 1
                 WHERE id = ?1",
                params![id],
            )?;
            Ok(conn.query_row(
                "SELECT retry_count FROM conversations WHERE id = ?1",
                params![id],
                |r| r.get(0),
            )?)
        })
    }

    pub fn fail_conversation(&self, id: i64) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE conversations SET status = 'failed' WHERE id = ?1",
                params![id],
            )?;
            Ok(())
        })
    }

    /// Most recent `n` conversations, oldest first.
    pub fn recent_conversations(&self, n: usize) -> Result<Vec<Conversation>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM conversations ORDER BY id DESC LIMIT ?1"
            ))?;
            let mut rows: Vec<Conversation> = stmt
                .query_map(params![n as i64], from_row)?
                .collect::<rusqlite::Result<_>>()?;
            rows.reverse();
            Ok(rows)
        })
    }

    /// Conversations strictly after `after_id`, oldest first.
    pub fn conversations_after(&self, after_id: i64, limit: Option<usize>) -> Result<Vec<Conversation>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM conversations WHERE id > ?1 ORDER BY id LIMIT ?2"
            ))?;
            let limit = limit.map(|n| n as i64).unwrap_or(-1);
            let rows = stmt
                .query_map(params![after_id, limit], from_row)?
                .collect::<rusqlite::Result<_>>()?;
            Ok(rows)
        })
    }

    /// Timestamp of the most recent delivered inbound message, if any.
    /// Used by stuck detection to know whether the assistant has been
    /// handed work since its last visible output.
    pub fn latest_delivery_at(&self) -> Result<Option<i64>> {
        self.with_conn(|conn| {
            Ok(conn.query_row(
                "SELECT MAX(timestamp) FROM conversations
                 WHERE direction = 'in' AND status = 'delivered'",
                [],
                |r| r.get(0),
            )?)
        })
    }

    /// Highest conversation id, if any rows exist.
    pub fn max_conversation_id(&self) -> Result<Option<i64>> {
        self.with_conn(|conn| {
            Ok(conn.query_row("SELECT MAX(id) FROM conversations", [], |r| r.get(0))?)
        })
    }
}
