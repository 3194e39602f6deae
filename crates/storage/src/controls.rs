// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Control queue operations.

use crate::error::parse_column;
use crate::{Result, StorageError, Store};
use rusqlite::{params, OptionalExtension, Row};
use warden_core::{ControlEntry, ControlStatus, NewControl, CONTROL_ID_PLACEHOLDER};

const COLUMNS: &str = "id, timestamp, channel, content, status, priority, require_idle, \
                       retry_count, ack_deadline_at, available_at, bypass_state, last_error";

fn from_row(row: &Row<'_>) -> rusqlite::Result<ControlEntry> {
    Ok(ControlEntry {
        id: row.get(0)?,
        timestamp: row.get(1)?,
        channel: row.get(2)?,
        content: row.get(3)?,
        status: parse_column(4, "control status", row.get(4)?, ControlStatus::parse)?,
        priority: row.get(5)?,
        require_idle: row.get(6)?,
        retry_count: row.get(7)?,
        ack_deadline_at: row.get(8)?,
        available_at: row.get(9)?,
        bypass_state: row.get(10)?,
        last_error: row.get(11)?,
    })
}

/// Result of an `ack` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckOutcome {
    /// Acknowledged in time.
    Done,
    /// Deadline had already passed; entry recorded as timed out.
    Timeout,
    /// Entry was already terminal; the ack is a no-op.
    AlreadyTerminal(ControlStatus),
}

impl Store {
    /// Enqueue a control entry. Any [`CONTROL_ID_PLACEHOLDER`] in the
    /// content is replaced with the new entry's id before the insert is
    /// visible, so a delivered acking instruction can name its own id.
    pub fn enqueue_control(&self, ctl: &NewControl, now: i64) -> Result<i64> {
        self.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;
            tx.execute(
                "INSERT INTO controls
                     (timestamp, channel, content, status, priority, require_idle,
                      retry_count, ack_deadline_at, available_at, bypass_state)
                 VALUES (?1, ?2, ?3, 'pending', ?4, ?5, 0, ?6, ?7, ?8)",
                params![
                    now,
                    ctl.channel,
                    ctl.content,
                    ctl.priority,
                    ctl.require_idle,
                    ctl.ack_deadline_at,
                    ctl.available_at,
                    ctl.bypass_state,
                ],
            )?;
            let id = tx.last_insert_rowid();
            if ctl.content.contains(CONTROL_ID_PLACEHOLDER) {
                tx.execute(
                    "UPDATE controls
                     SET content = replace(content, ?1, CAST(id AS TEXT))
                     WHERE id = ?2",
                    params![CONTROL_ID_PLACEHOLDER, id],
                )?;
            }
            tx.commit()?;
            Ok(id)
        })
    }

    pub fn control(&self, id: i64) -> Result<ControlEntry> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT {COLUMNS} FROM controls WHERE id = ?1"),
                params![id],
                from_row,
            )
            .optional()?
            .ok_or_else(|| StorageError::NotFound(format!("control {id}")))
        })
    }

    /// Convert non-terminal entries past their ack deadline to `timeout`.
    /// Returns the number converted.
    pub fn expire_overdue_controls(&self, now: i64) -> Result<usize> {
        self.with_conn(|conn| {
            Ok(conn.execute(
                "UPDATE controls
                 SET status = 'timeout', last_error = 'ack deadline passed'
                 WHERE status IN ('pending', 'running')
                   AND ack_deadline_at IS NOT NULL AND ack_deadline_at < ?1",
                params![now],
            )?)
        })
    }

    /// Best deliverable control candidate without claiming it.
    ///
    /// Skips entries not yet available, entries gated on health when the
    /// state is not ok (unless `bypass_state`), and idle-required entries
    /// when the assistant is not idle.
    pub fn peek_next_control(
        &self,
        now: i64,
        idle: bool,
        health_ok: bool,
    ) -> Result<Option<ControlEntry>> {
        let idle_gate = if idle {
            ""
        } else {
            "AND priority > 1 AND require_idle = 0"
        };
        self.with_conn(|conn| {
            Ok(conn
                .query_row(
                    &format!(
                        "SELECT {COLUMNS} FROM controls
                         WHERE status = 'pending'
                           AND (available_at IS NULL OR available_at <= ?1)
                           AND (ack_deadline_at IS NULL OR ack_deadline_at >= ?1)
                           AND (bypass_state = 1 OR ?2)
                           {idle_gate}
                         ORDER BY priority, timestamp, id
                         LIMIT 1"
                    ),
                    params![now, health_ok],
                    from_row,
                )
                .optional()?)
        })
    }

    /// Atomically claim a pending control for delivery.
    pub fn claim_control(&self, id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE controls SET status = 'running'
                 WHERE id = ?1 AND status = 'pending'",
                params![id],
            )?;
            Ok(changed == 1)
        })
    }

    /// Revert a claimed control to `pending` after a transport failure.
    /// Returns the new retry count.
    pub fn release_control(&self, id: i64, error: &str) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE controls
                 SET status = 'pending', retry_count = retry_count + 1, last_error = ?2
                 WHERE id = ?1",
                params![id, error],
            )?;
            Ok(conn.query_row(
                "SELECT retry_count FROM controls WHERE id = ?1",
                params![id],
                |r| r.get(0),
            )?)
        })
    }

    pub fn fail_control(&self, id: i64, error: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE controls SET status = 'failed', last_error = ?2 WHERE id = ?1",
                params![id, error],
            )?;
            Ok(())
        })
    }

    /// Acknowledge a control entry. Idempotent: a terminal entry reports
    /// its existing status; a live entry past its deadline becomes
    /// `timeout` instead of `done`.
    pub fn ack_control(&self, id: i64, now: i64) -> Result<AckOutcome> {
        let entry = self.control(id)?;
        if entry.status.is_terminal() {
            return Ok(AckOutcome::AlreadyTerminal(entry.status));
        }
        if entry.deadline_passed(now) {
            self.with_conn(|conn| {
                conn.execute(
                    "UPDATE controls
                     SET status = 'timeout', last_error = 'ack deadline passed'
                     WHERE id = ?1 AND status IN ('pending', 'running')",
                    params![id],
                )?;
                Ok(())
            })?;
            return Ok(AckOutcome::Timeout);
        }
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE controls SET status = 'done'
                 WHERE id = ?1 AND status IN ('pending', 'running')",
                params![id],
            )?;
            Ok(())
        })?;
        Ok(AckOutcome::Done)
    }

    /// The in-flight heartbeat probe, if one exists. Channels of
    /// heartbeat probes are namespaced `heartbeat:<phase>`.
    pub fn pending_heartbeat(&self) -> Result<Option<ControlEntry>> {
        self.with_conn(|conn| {
            Ok(conn
                .query_row(
                    &format!(
                        "SELECT {COLUMNS} FROM controls
                         WHERE channel LIKE 'heartbeat:%'
                           AND status IN ('pending', 'running')
                         ORDER BY id DESC
                         LIMIT 1"
                    ),
                    [],
                    from_row,
                )
                .optional()?)
        })
    }

    /// Abandon all in-flight heartbeat probes (phase changed underneath
    /// them). Returns the number cleared.
    pub fn clear_pending_heartbeats(&self, reason: &str) -> Result<usize> {
        self.with_conn(|conn| {
            Ok(conn.execute(
                "UPDATE controls
                 SET status = 'failed', last_error = ?1
                 WHERE channel LIKE 'heartbeat:%' AND status IN ('pending', 'running')",
                params![reason],
            )?)
        })
    }
}
