// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The task scheduler: turn rows of the task table into enqueued
//! messages on the conversation queue at the right times.
//!
//! One task dispatches per cycle. An occurrence that has fallen outside
//! its miss window is skipped: one-time tasks fail, repeating tasks
//! advance to the next occurrence. Completed repeating tasks are put
//! back on the schedule, stale `running` rows are reaped, and history is
//! purged hourly.

use crate::{schedule, status, EngineError};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use warden_core::task::TASK_RUNNING_TIMEOUT_SECS;
use warden_core::{
    Clock, NewMessage, Task, TaskHistoryStatus, TaskKind, TaskStatus, PRIORITY_SYSTEM,
};
use warden_storage::Store;

/// Main loop period.
pub const CYCLE_INTERVAL: Duration = Duration::from_secs(10);

/// History rows older than this are purged.
const HISTORY_RETENTION_SECS: i64 = 30 * 86_400;
/// How often the purge runs.
const HISTORY_PURGE_INTERVAL_SECS: i64 = 3_600;

/// Error recorded on a one-time task whose window was missed.
pub const MISSED_WINDOW_ERROR: &str = "Missed execution window";

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub status_path: PathBuf,
    /// CLI prefix the assistant runs on completion, completed with the id.
    pub done_command: String,
    /// CLI prefix for reply routing in the wrapped prompt.
    pub send_command: String,
}

impl SchedulerConfig {
    pub fn new(status_path: impl Into<PathBuf>) -> Self {
        Self {
            status_path: status_path.into(),
            done_command: "warden task done".to_string(),
            send_command: "warden send".to_string(),
        }
    }
}

/// What one cycle accomplished, for logging and tests.
#[derive(Debug, Default)]
pub struct CycleReport {
    pub skipped_not_alive: bool,
    pub dispatched: Option<String>,
    pub missed: Option<String>,
    pub rescheduled: usize,
    pub reaped: usize,
    pub purged_history: usize,
}

pub struct Scheduler {
    store: Arc<Store>,
    clock: Arc<dyn Clock>,
    cfg: SchedulerConfig,
    last_history_purge: i64,
}

impl Scheduler {
    pub fn new(store: Arc<Store>, clock: Arc<dyn Clock>, cfg: SchedulerConfig) -> Self {
        Self {
            store,
            clock,
            cfg,
            last_history_purge: 0,
        }
    }

    /// Startup validation: every stored schedule must parse. A task table
    /// the scheduler cannot evaluate is a configuration error and fatal.
    pub fn validate_tasks(store: &Store) -> Result<(), EngineError> {
        for task in store.list_tasks(None)? {
            let cron = match task.kind {
                TaskKind::Recurring => task.cron_expression.as_deref(),
                _ => None,
            };
            schedule::validate(cron, task.timezone.as_deref())?;
        }
        Ok(())
    }

    pub fn cycle(&mut self) -> Result<CycleReport, EngineError> {
        let now = self.clock.now();
        let mut report = CycleReport::default();

        // Skip the whole cycle while the assistant cannot possibly run a
        // task; dispatching would only burn miss windows.
        let alive = status::read_status(&self.cfg.status_path)
            .map(|s| s.state.is_alive())
            .unwrap_or(false);
        if !alive {
            report.skipped_not_alive = true;
            return Ok(report);
        }

        if let Some(task) = self.store.due_task(now)? {
            if task.missed_window(now) {
                self.handle_missed(&task, now)?;
                report.missed = Some(task.id.to_string());
            } else if self.dispatch(&task, now)? {
                report.dispatched = Some(task.id.to_string());
            }
        }

        report.rescheduled = self.reschedule_completed(now)?;
        report.reaped = self.reap_stale_running(now)?;

        if now - self.last_history_purge >= HISTORY_PURGE_INTERVAL_SECS {
            report.purged_history = self
                .store
                .purge_task_history(now - HISTORY_RETENTION_SECS)?;
            self.last_history_purge = now;
        }

        Ok(report)
    }

    fn handle_missed(&self, task: &Task, now: i64) -> Result<(), EngineError> {
        tracing::warn!(
            task_id = %task.id,
            overdue = now - task.next_run_at,
            threshold = task.miss_threshold,
            "task missed its execution window"
        );
        match task.kind {
            TaskKind::OneTime => {
                self.store
                    .set_task_status(&task.id, TaskStatus::Failed, Some(MISSED_WINDOW_ERROR), now)?;
                self.store.append_task_history(
                    &task.id,
                    now,
                    TaskHistoryStatus::Failed,
                    Some(MISSED_WINDOW_ERROR),
                )?;
            }
            TaskKind::Recurring | TaskKind::Interval => {
                self.advance_schedule(task, now)?;
            }
        }
        Ok(())
    }

    /// Atomic dispatch: claim, record history, wrap the prompt, enqueue.
    /// Losing the claim race is silent; a failed enqueue reverts the task.
    fn dispatch(&self, task: &Task, now: i64) -> Result<bool, EngineError> {
        if !self.store.claim_task(&task.id, now)? {
            return Ok(false);
        }
        self.store
            .append_task_history(&task.id, now, TaskHistoryStatus::Started, None)?;

        let msg = NewMessage {
            channel: "scheduler".to_string(),
            endpoint_id: None,
            content: self.build_prompt(task),
            priority: task.priority,
            require_idle: task.require_idle || task.priority == PRIORITY_SYSTEM,
        };

        match self.store.insert_message(&msg, now) {
            Ok(conversation_id) => {
                tracing::info!(task_id = %task.id, conversation_id, "task dispatched");
                Ok(true)
            }
            Err(e) => {
                tracing::warn!(task_id = %task.id, error = %e, "task enqueue failed; reverting");
                self.store.set_task_status(
                    &task.id,
                    TaskStatus::Pending,
                    Some("enqueue failed"),
                    now,
                )?;
                self.store.append_task_history(
                    &task.id,
                    now,
                    TaskHistoryStatus::Failed,
                    Some(&format!("enqueue failed: {e}")),
                )?;
                Ok(false)
            }
        }
    }

    fn build_prompt(&self, task: &Task) -> String {
        let mut content = task.prompt.clone();
        if let Some(channel) = &task.reply_channel {
            content.push_str(" ---- reply via: ");
            content.push_str(&self.cfg.send_command);
            content.push(' ');
            content.push_str(channel);
            if let Some(endpoint) = &task.reply_endpoint {
                content.push(' ');
                content.push_str(endpoint);
            }
        }
        format!(
            "{content}\n\nScheduled task \"{}\". When it is complete, run: {} {}",
            task.name, self.cfg.done_command, task.id
        )
    }

    /// Move completed repeating tasks back to pending with a fresh
    /// `next_run_at`. One-time tasks stay completed.
    fn reschedule_completed(&self, now: i64) -> Result<usize, EngineError> {
        let mut count = 0;
        for task in self.store.completed_repeating_tasks()? {
            self.advance_schedule(&task, now)?;
            count += 1;
        }
        Ok(count)
    }

    fn advance_schedule(&self, task: &Task, now: i64) -> Result<(), EngineError> {
        let next = match task.kind {
            TaskKind::Recurring => match task.cron_expression.as_deref() {
                Some(expr) => {
                    match schedule::next_cron_occurrence(expr, task.timezone.as_deref(), now) {
                        Ok(next) => next,
                        Err(e) => {
                            self.store.set_task_status(
                                &task.id,
                                TaskStatus::Failed,
                                Some(&e.to_string()),
                                now,
                            )?;
                            return Ok(());
                        }
                    }
                }
                None => None,
            },
            TaskKind::Interval => task
                .interval_seconds
                .map(|every| schedule::next_interval_occurrence(task.next_run_at, every, now)),
            TaskKind::OneTime => None,
        };

        match next {
            Some(next_run_at) => {
                tracing::info!(task_id = %task.id, next_run_at, "task rescheduled");
                self.store.reschedule_task(&task.id, next_run_at, now)?;
            }
            None => {
                self.store.set_task_status(
                    &task.id,
                    TaskStatus::Failed,
                    Some("no schedule to advance"),
                    now,
                )?;
            }
        }
        Ok(())
    }

    /// Reap `running` tasks nothing has touched for an hour. The claim
    /// holder is gone; one-time tasks fail, repeating tasks complete and
    /// get rescheduled on the next pass.
    fn reap_stale_running(&self, now: i64) -> Result<usize, EngineError> {
        let cutoff = now - TASK_RUNNING_TIMEOUT_SECS;
        let mut count = 0;
        for task in self.store.stale_running_tasks(cutoff)? {
            tracing::warn!(task_id = %task.id, "reaping stale running task");
            self.store.append_task_history(
                &task.id,
                now,
                TaskHistoryStatus::Failed,
                Some("running task timed out"),
            )?;
            let status = match task.kind {
                TaskKind::OneTime => TaskStatus::Failed,
                TaskKind::Recurring | TaskKind::Interval => TaskStatus::Completed,
            };
            self.store
                .set_task_status(&task.id, status, Some("running task timed out"), now)?;
            count += 1;
        }
        Ok(count)
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
