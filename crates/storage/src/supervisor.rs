// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The single-row supervision health register.
//!
//! The heartbeat engine (inside the guardian process) owns writes; the
//! CLI reads it to refuse ingestion while health is not ok. The status
//! file mirrors the `health` column for consumers that must not touch
//! the database.

use crate::error::parse_column;
use crate::{Result, Store};
use rusqlite::{params, Row};
use warden_core::Health;

/// Durable supervision state.
#[derive(Debug, Clone)]
pub struct SupervisorState {
    pub health: Health,
    /// Consecutive recovery-probe failures.
    pub fail_count: i64,
    /// When the last successful heartbeat resolved.
    pub last_heartbeat_at: i64,
    /// When the last probe of any phase was enqueued or resolved.
    pub last_probe_at: i64,
    /// Control id of the in-flight probe, if any.
    pub inflight_control_id: Option<i64>,
    /// Phase tag of the in-flight probe, if any.
    pub inflight_phase: Option<String>,
    /// When a rate limit is expected to lift, if known.
    pub rate_limit_reset_at: Option<i64>,
    pub updated_at: i64,
}

fn from_row(row: &Row<'_>) -> rusqlite::Result<SupervisorState> {
    Ok(SupervisorState {
        health: parse_column(0, "health", row.get(0)?, Health::parse)?,
        fail_count: row.get(1)?,
        last_heartbeat_at: row.get(2)?,
        last_probe_at: row.get(3)?,
        inflight_control_id: row.get(4)?,
        inflight_phase: row.get(5)?,
        rate_limit_reset_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

impl Store {
    pub fn supervisor_state(&self) -> Result<SupervisorState> {
        self.with_conn(|conn| {
            Ok(conn.query_row(
                "SELECT health, fail_count, last_heartbeat_at, last_probe_at,
                        inflight_control_id, inflight_phase, rate_limit_reset_at, updated_at
                 FROM supervisor WHERE id = 1",
                [],
                from_row,
            )?)
        })
    }

    pub fn update_supervisor(&self, state: &SupervisorState, now: i64) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE supervisor SET
                     health = ?1, fail_count = ?2, last_heartbeat_at = ?3,
                     last_probe_at = ?4, inflight_control_id = ?5, inflight_phase = ?6,
                     rate_limit_reset_at = ?7, updated_at = ?8
                 WHERE id = 1",
                params![
                    state.health.as_str(),
                    state.fail_count,
                    state.last_heartbeat_at,
                    state.last_probe_at,
                    state.inflight_control_id,
                    state.inflight_phase,
                    state.rate_limit_reset_at,
                    now,
                ],
            )?;
            Ok(())
        })
    }

    /// Convenience read of just the health column.
    pub fn health(&self) -> Result<Health> {
        Ok(self.supervisor_state()?.health)
    }
}
