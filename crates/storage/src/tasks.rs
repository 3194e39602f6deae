// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task table and dispatch-history operations.

use crate::error::parse_column;
use crate::{Result, StorageError, Store};
use rusqlite::{params, OptionalExtension, Row};
use warden_core::{Task, TaskHistoryEntry, TaskHistoryStatus, TaskId, TaskKind, TaskStatus};

const COLUMNS: &str = "id, name, prompt, kind, cron_expression, interval_seconds, timezone, \
                       next_run_at, priority, require_idle, miss_threshold, reply_channel, \
                       reply_endpoint, status, last_error, created_at, updated_at";

fn from_row(row: &Row<'_>) -> rusqlite::Result<Task> {
    Ok(Task {
        id: TaskId::new(row.get::<_, String>(0)?),
        name: row.get(1)?,
        prompt: row.get(2)?,
        kind: parse_column(3, "task kind", row.get(3)?, TaskKind::parse)?,
        cron_expression: row.get(4)?,
        interval_seconds: row.get(5)?,
        timezone: row.get(6)?,
        next_run_at: row.get(7)?,
        priority: row.get(8)?,
        require_idle: row.get(9)?,
        miss_threshold: row.get(10)?,
        reply_channel: row.get(11)?,
        reply_endpoint: row.get(12)?,
        status: parse_column(13, "task status", row.get(13)?, TaskStatus::parse)?,
        last_error: row.get(14)?,
        created_at: row.get(15)?,
        updated_at: row.get(16)?,
    })
}

fn history_from_row(row: &Row<'_>) -> rusqlite::Result<TaskHistoryEntry> {
    Ok(TaskHistoryEntry {
        id: row.get(0)?,
        task_id: TaskId::new(row.get::<_, String>(1)?),
        run_at: row.get(2)?,
        status: parse_column(3, "history status", row.get(3)?, TaskHistoryStatus::parse)?,
        detail: row.get(4)?,
    })
}

impl Store {
    pub fn insert_task(&self, task: &Task) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                &format!(
                    "INSERT INTO tasks ({COLUMNS})
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)"
                ),
                params![
                    task.id.as_str(),
                    task.name,
                    task.prompt,
                    task.kind.as_str(),
                    task.cron_expression,
                    task.interval_seconds,
                    task.timezone,
                    task.next_run_at,
                    task.priority,
                    task.require_idle,
                    task.miss_threshold,
                    task.reply_channel,
                    task.reply_endpoint,
                    task.status.as_str(),
                    task.last_error,
                    task.created_at,
                    task.updated_at,
                ],
            )?;
            Ok(())
        })
    }

    /// Full-row update (id immutable).
    pub fn update_task(&self, task: &Task) -> Result<()> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE tasks SET
                     name = ?2, prompt = ?3, kind = ?4, cron_expression = ?5,
                     interval_seconds = ?6, timezone = ?7, next_run_at = ?8,
                     priority = ?9, require_idle = ?10, miss_threshold = ?11,
                     reply_channel = ?12, reply_endpoint = ?13, status = ?14,
                     last_error = ?15, updated_at = ?16
                 WHERE id = ?1",
                params![
                    task.id.as_str(),
                    task.name,
                    task.prompt,
                    task.kind.as_str(),
                    task.cron_expression,
                    task.interval_seconds,
                    task.timezone,
                    task.next_run_at,
                    task.priority,
                    task.require_idle,
                    task.miss_threshold,
                    task.reply_channel,
                    task.reply_endpoint,
                    task.status.as_str(),
                    task.last_error,
                    task.updated_at,
                ],
            )?;
            if changed == 0 {
                return Err(StorageError::NotFound(format!("task {}", task.id)));
            }
            Ok(())
        })
    }

    pub fn task(&self, id: &TaskId) -> Result<Task> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT {COLUMNS} FROM tasks WHERE id = ?1"),
                params![id.as_str()],
                from_row,
            )
            .optional()?
            .ok_or_else(|| StorageError::NotFound(format!("task {id}")))
        })
    }

    pub fn list_tasks(&self, status: Option<TaskStatus>) -> Result<Vec<Task>> {
        self.with_conn(|conn| {
            let rows = match status {
                Some(s) => {
                    let mut stmt = conn.prepare(&format!(
                        "SELECT {COLUMNS} FROM tasks WHERE status = ?1 ORDER BY next_run_at, id"
                    ))?;
                    let result = stmt
                        .query_map(params![s.as_str()], from_row)?
                        .collect::<rusqlite::Result<_>>()?;
                    result
                }
                None => {
                    let mut stmt = conn.prepare(&format!(
                        "SELECT {COLUMNS} FROM tasks ORDER BY next_run_at, id"
                    ))?;
                    let result = stmt
                        .query_map([], from_row)?
                        .collect::<rusqlite::Result<_>>()?;
                    result
                }
            };
            Ok(rows)
        })
    }

    /// The single next due pending task: due rows ordered by priority,
    /// then by how long they have been due.
    pub fn due_task(&self, now: i64) -> Result<Option<Task>> {
        self.with_conn(|conn| {
            Ok(conn
                .query_row(
                    &format!(
                        "SELECT {COLUMNS} FROM tasks
                         WHERE status = 'pending' AND next_run_at <= ?1
                         ORDER BY priority, next_run_at, id
                         LIMIT 1"
                    ),
                    params![now],
                    from_row,
                )
                .optional()?)
        })
    }

    /// Next pending tasks by schedule time (for `task next`).
    pub fn next_pending_tasks(&self, limit: usize) -> Result<Vec<Task>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM tasks
                 WHERE status = 'pending'
                 ORDER BY next_run_at, id
                 LIMIT ?1"
            ))?;
            let rows = stmt
                .query_map(params![limit as i64], from_row)?
                .collect::<rusqlite::Result<_>>()?;
            Ok(rows)
        })
    }

    /// Atomically claim a pending task for dispatch.
    pub fn claim_task(&self, id: &TaskId, now: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE tasks SET status = 'running', updated_at = ?2
                 WHERE id = ?1 AND status = 'pending'",
                params![id.as_str(), now],
            )?;
            Ok(changed == 1)
        })
    }

    pub fn set_task_status(
        &self,
        id: &TaskId,
        status: TaskStatus,
        last_error: Option<&str>,
        now: i64,
    ) -> Result<()> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE tasks SET status = ?2, last_error = ?3, updated_at = ?4
                 WHERE id = ?1",
                params![id.as_str(), status.as_str(), last_error, now],
            )?;
            if changed == 0 {
                return Err(StorageError::NotFound(format!("task {id}")));
            }
            Ok(())
        })
    }

    /// Put a repeating task back on the schedule.
    pub fn reschedule_task(&self, id: &TaskId, next_run_at: i64, now: i64) -> Result<()> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE tasks
                 SET status = 'pending', next_run_at = ?2, last_error = NULL, updated_at = ?3
                 WHERE id = ?1",
                params![id.as_str(), next_run_at, now],
            )?;
            if changed == 0 {
                return Err(StorageError::NotFound(format!("task {id}")));
            }
            Ok(())
        })
    }

    /// Repeating tasks that finished and await rescheduling.
    pub fn completed_repeating_tasks(&self) -> Result<Vec<Task>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM tasks
                 WHERE status = 'completed' AND kind != 'one-time'
                 ORDER BY id"
            ))?;
            let rows = stmt
                .query_map([], from_row)?
                .collect::<rusqlite::Result<_>>()?;
            Ok(rows)
        })
    }

    /// Running tasks whose `updated_at` predates `cutoff`.
    pub fn stale_running_tasks(&self, cutoff: i64) -> Result<Vec<Task>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM tasks
                 WHERE status = 'running' AND updated_at < ?1
                 ORDER BY id"
            ))?;
            let rows = stmt
                .query_map(params![cutoff], from_row)?
                .collect::<rusqlite::Result<_>>()?;
            Ok(rows)
        })
    }

    pub fn running_tasks(&self) -> Result<Vec<Task>> {
        self.list_tasks(Some(TaskStatus::Running))
    }

    /// Delete a task (history cascades). Returns false when absent.
    pub fn remove_task(&self, id: &TaskId) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute("DELETE FROM tasks WHERE id = ?1", params![id.as_str()])?;
            Ok(changed == 1)
        })
    }

    pub fn append_task_history(
        &self,
        id: &TaskId,
        run_at: i64,
        status: TaskHistoryStatus,
        detail: Option<&str>,
    ) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO task_history (task_id, run_at, status, detail)
                 VALUES (?1, ?2, ?3, ?4)",
                params![id.as_str(), run_at, status.as_str(), detail],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// Most recent history rows for a task, newest first.
    pub fn task_history(&self, id: &TaskId, limit: usize) -> Result<Vec<TaskHistoryEntry>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, task_id, run_at, status, detail FROM task_history
                 WHERE task_id = ?1
                 ORDER BY run_at DESC, id DESC
                 LIMIT ?2",
            )?;
            let rows = stmt
                .query_map(params![id.as_str(), limit as i64], history_from_row)?
                .collect::<rusqlite::Result<_>>()?;
            Ok(rows)
        })
    }

    /// Drop history rows older than `before`. Returns the number purged.
    pub fn purge_task_history(&self, before: i64) -> Result<usize> {
        self.with_conn(|conn| {
            Ok(conn.execute(
                "DELETE FROM task_history WHERE run_at < ?1",
                params![before],
            )?)
        })
    }
}
