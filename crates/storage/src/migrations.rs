// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Forward-only schema migrations driven by `PRAGMA user_version`.
//!
//! Each entry migrates the schema from version `i` to `i + 1`. Migrations
//! run inside a transaction; a fresh database replays all of them, an
//! existing one only what it is missing.

use crate::Result;
use rusqlite::Connection;

pub(crate) const SCHEMA_VERSION: i64 = 1;

const MIGRATIONS: &[&str] = &[
    // v1: initial schema
    r#"
    CREATE TABLE conversations (
        id              INTEGER PRIMARY KEY AUTOINCREMENT,
        timestamp       INTEGER NOT NULL,
        direction       TEXT    NOT NULL CHECK (direction IN ('in', 'out')),
        channel         TEXT    NOT NULL,
        endpoint_id     TEXT,
        content         TEXT    NOT NULL,
        status          TEXT    NOT NULL DEFAULT 'pending',
        priority        INTEGER NOT NULL DEFAULT 3,
        require_idle    INTEGER NOT NULL DEFAULT 0,
        retry_count     INTEGER NOT NULL DEFAULT 0
    );
    CREATE INDEX idx_conversations_inbound
        ON conversations (status, priority, timestamp, id)
        WHERE direction = 'in';

    CREATE TABLE controls (
        id              INTEGER PRIMARY KEY AUTOINCREMENT,
        timestamp       INTEGER NOT NULL,
        channel         TEXT    NOT NULL,
        content         TEXT    NOT NULL,
        status          TEXT    NOT NULL DEFAULT 'pending',
        priority        INTEGER NOT NULL DEFAULT 1,
        require_idle    INTEGER NOT NULL DEFAULT 0,
        retry_count     INTEGER NOT NULL DEFAULT 0,
        ack_deadline_at INTEGER,
        available_at    INTEGER,
        bypass_state    INTEGER NOT NULL DEFAULT 0,
        last_error      TEXT
    );
    CREATE INDEX idx_controls_queue
        ON controls (status, priority, timestamp, id);

    CREATE TABLE checkpoints (
        id                    INTEGER PRIMARY KEY AUTOINCREMENT,
        start_conversation_id INTEGER NOT NULL,
        end_conversation_id   INTEGER NOT NULL,
        summary               TEXT,
        created_at            INTEGER NOT NULL
    );

    CREATE TABLE tasks (
        id               TEXT PRIMARY KEY,
        name             TEXT    NOT NULL,
        prompt           TEXT    NOT NULL,
        kind             TEXT    NOT NULL CHECK (kind IN ('one-time', 'recurring', 'interval')),
        cron_expression  TEXT,
        interval_seconds INTEGER,
        timezone         TEXT,
        next_run_at      INTEGER NOT NULL,
        priority         INTEGER NOT NULL DEFAULT 3,
        require_idle     INTEGER NOT NULL DEFAULT 0,
        miss_threshold   INTEGER NOT NULL DEFAULT 600,
        reply_channel    TEXT,
        reply_endpoint   TEXT,
        status           TEXT    NOT NULL DEFAULT 'pending',
        last_error       TEXT,
        created_at       INTEGER NOT NULL,
        updated_at       INTEGER NOT NULL
    );
    CREATE INDEX idx_tasks_due ON tasks (status, next_run_at);

    CREATE TABLE task_history (
        id      INTEGER PRIMARY KEY AUTOINCREMENT,
        task_id TEXT    NOT NULL REFERENCES tasks (id) ON DELETE CASCADE,
        run_at  INTEGER NOT NULL,
        status  TEXT    NOT NULL,
        detail  TEXT
    );
    CREATE INDEX idx_task_history_task ON task_history (task_id, run_at);

    CREATE TABLE supervisor (
        id                  INTEGER PRIMARY KEY CHECK (id = 1),
        health              TEXT    NOT NULL DEFAULT 'ok',
        fail_count          INTEGER NOT NULL DEFAULT 0,
        last_heartbeat_at   INTEGER NOT NULL DEFAULT 0,
        last_probe_at       INTEGER NOT NULL DEFAULT 0,
        inflight_control_id INTEGER,
        inflight_phase      TEXT,
        rate_limit_reset_at INTEGER,
        updated_at          INTEGER NOT NULL DEFAULT 0
    );
    INSERT INTO supervisor (id) VALUES (1);
    "#,
];

/// Apply any missing migrations. Idempotent.
pub(crate) fn migrate(conn: &Connection) -> Result<()> {
    let current: i64 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;

    for (i, sql) in MIGRATIONS.iter().enumerate() {
        let target = i as i64 + 1;
        if current >= target {
            continue;
        }
        tracing::info!(from = current, to = target, "applying schema migration");
        conn.execute_batch(&format!(
            "BEGIN;\n{}\nPRAGMA user_version = {};\nCOMMIT;",
            sql, target
        ))?;
    }

    Ok(())
}
