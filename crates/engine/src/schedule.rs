// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Schedule computation for cron and interval tasks.
//!
//! Task rows store standard 5-field cron expressions; the parser wants a
//! seconds field, so expressions are normalized by prepending one. Cron
//! evaluation happens in the task's stored IANA timezone.

use chrono::TimeZone;
use chrono_tz::Tz;
use cron::Schedule;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("invalid cron expression '{expr}': {reason}")]
    InvalidCron { expr: String, reason: String },
    #[error("invalid timezone '{0}'")]
    InvalidTimezone(String),
}

/// Resolve an optional IANA zone name. Absent means UTC.
pub fn parse_timezone(tz: Option<&str>) -> Result<Tz, ScheduleError> {
    match tz {
        None => Ok(chrono_tz::UTC),
        Some(name) => name
            .parse::<Tz>()
            .map_err(|_| ScheduleError::InvalidTimezone(name.to_string())),
    }
}

fn normalize(expr: &str) -> Result<String, ScheduleError> {
    match expr.split_whitespace().count() {
        5 => Ok(format!("0 {}", expr.trim())),
        6 | 7 => Ok(expr.trim().to_string()),
        n => Err(ScheduleError::InvalidCron {
            expr: expr.to_string(),
            reason: format!("expected 5 fields, got {n}"),
        }),
    }
}

/// Parse a 5-field cron expression.
pub fn parse_cron(expr: &str) -> Result<Schedule, ScheduleError> {
    let normalized = normalize(expr)?;
    Schedule::from_str(&normalized).map_err(|e| ScheduleError::InvalidCron {
        expr: expr.to_string(),
        reason: e.to_string(),
    })
}

/// Validate a task's schedule fields without computing anything.
pub fn validate(cron_expr: Option<&str>, tz: Option<&str>) -> Result<(), ScheduleError> {
    if let Some(expr) = cron_expr {
        parse_cron(expr)?;
    }
    parse_timezone(tz)?;
    Ok(())
}

/// Next cron occurrence strictly after `after` (unix seconds), evaluated
/// in the given timezone.
pub fn next_cron_occurrence(
    expr: &str,
    tz: Option<&str>,
    after: i64,
) -> Result<Option<i64>, ScheduleError> {
    let schedule = parse_cron(expr)?;
    let tz = parse_timezone(tz)?;
    let after_dt = match tz.timestamp_opt(after, 0) {
        chrono::LocalResult::Single(dt) => dt,
        _ => return Ok(None),
    };
    Ok(schedule.after(&after_dt).next().map(|dt| dt.timestamp()))
}

/// Next interval occurrence strictly after `now`, anchored at the prior
/// occurrence so the cadence does not drift.
pub fn next_interval_occurrence(prior: i64, every: i64, now: i64) -> i64 {
    let every = every.max(1);
    let mut next = prior + every;
    if next <= now {
        let missed = (now - next) / every + 1;
        next += missed * every;
    }
    next
}

#[cfg(test)]
#[path = "schedule_tests.rs"]
mod tests;
