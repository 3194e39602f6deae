// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use warden_core::{TaskHistoryStatus, TaskStatus};

#[test]
fn insert_fetch_update_remove() {
    let store = store();
    let mut task = sample_task("t-1", TaskKind::OneTime, 1_000);
    store.insert_task(&task).unwrap();

    let fetched = store.task(&task.id).unwrap();
    assert_eq!(fetched.name, "task t-1");
    assert_eq!(fetched.status, TaskStatus::Pending);

    task.name = "renamed".to_string();
    task.priority = 1;
    store.update_task(&task).unwrap();
    let fetched = store.task(&task.id).unwrap();
    assert_eq!(fetched.name, "renamed");
    assert_eq!(fetched.priority, 1);

    assert!(store.remove_task(&task.id).unwrap());
    assert!(!store.remove_task(&task.id).unwrap());
    assert!(store.task(&task.id).is_err());
}

#[test]
fn due_task_orders_by_priority_then_due_time() {
    let store = store();
    let mut low = sample_task("low", TaskKind::OneTime, 100);
    low.priority = 3;
    let mut high = sample_task("high", TaskKind::OneTime, 200);
    high.priority = 1;
    let future = sample_task("future", TaskKind::OneTime, 10_000);
    store.insert_task(&low).unwrap();
    store.insert_task(&high).unwrap();
    store.insert_task(&future).unwrap();

    // Both low and high are due at t=500; priority wins.
    let due = store.due_task(500).unwrap().unwrap();
    assert_eq!(due.id, high.id);

    // Nothing due before the earliest next_run_at.
    assert!(store.due_task(50).unwrap().is_none());
}

#[test]
fn claim_task_is_atomic() {
    let store = store();
    let task = sample_task("t-1", TaskKind::Interval, 100);
    store.insert_task(&task).unwrap();

    assert!(store.claim_task(&task.id, 150).unwrap());
    assert!(!store.claim_task(&task.id, 150).unwrap());

    let claimed = store.task(&task.id).unwrap();
    assert_eq!(claimed.status, TaskStatus::Running);
    assert_eq!(claimed.updated_at, 150);
}

#[test]
fn reschedule_returns_to_pending_and_clears_error() {
    let store = store();
    let mut task = sample_task("t-1", TaskKind::Interval, 100);
    task.status = TaskStatus::Completed;
    task.last_error = Some("old".to_string());
    store.insert_task(&task).unwrap();

    store.reschedule_task(&task.id, 3_700, 200).unwrap();
    let fetched = store.task(&task.id).unwrap();
    assert_eq!(fetched.status, TaskStatus::Pending);
    assert_eq!(fetched.next_run_at, 3_700);
    assert!(fetched.last_error.is_none());
}

#[test]
fn completed_repeating_excludes_one_time() {
    let store = store();
    let mut one = sample_task("one", TaskKind::OneTime, 100);
    one.status = TaskStatus::Completed;
    let mut cron = sample_task("cron", TaskKind::Recurring, 100);
    cron.status = TaskStatus::Completed;
    let mut interval = sample_task("ivl", TaskKind::Interval, 100);
    interval.status = TaskStatus::Completed;
    store.insert_task(&one).unwrap();
    store.insert_task(&cron).unwrap();
    store.insert_task(&interval).unwrap();

    let repeating = store.completed_repeating_tasks().unwrap();
    let ids: Vec<&str> = repeating.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["cron", "ivl"]);
}

#[test]
fn stale_running_cutoff() {
    let store = store();
    let mut stale = sample_task("stale", TaskKind::Interval, 100);
    stale.status = TaskStatus::Running;
    stale.updated_at = 1_000;
    let mut fresh = sample_task("fresh", TaskKind::Interval, 100);
    fresh.status = TaskStatus::Running;
    fresh.updated_at = 5_000;
    store.insert_task(&stale).unwrap();
    store.insert_task(&fresh).unwrap();

    let reaped = store.stale_running_tasks(4_600).unwrap();
    assert_eq!(reaped.len(), 1);
    assert_eq!(reaped[0].id, stale.id);
}

#[test]
fn set_status_records_error() {
    let store = store();
    let task = sample_task("t-1", TaskKind::OneTime, 100);
    store.insert_task(&task).unwrap();

    store
        .set_task_status(&task.id, TaskStatus::Failed, Some("Missed execution window"), 900)
        .unwrap();
    let fetched = store.task(&task.id).unwrap();
    assert_eq!(fetched.status, TaskStatus::Failed);
    assert_eq!(fetched.last_error.as_deref(), Some("Missed execution window"));
    assert_eq!(fetched.updated_at, 900);
}

#[test]
fn history_append_list_purge() {
    let store = store();
    let task = sample_task("t-1", TaskKind::Interval, 100);
    store.insert_task(&task).unwrap();

    store
        .append_task_history(&task.id, 100, TaskHistoryStatus::Started, None)
        .unwrap();
    store
        .append_task_history(&task.id, 200, TaskHistoryStatus::Completed, Some("ok"))
        .unwrap();
    store
        .append_task_history(&task.id, 300, TaskHistoryStatus::Failed, Some("boom"))
        .unwrap();

    let history = store.task_history(&task.id, 2).unwrap();
    assert_eq!(history.len(), 2);
    // Newest first.
    assert_eq!(history[0].run_at, 300);
    assert_eq!(history[0].status, TaskHistoryStatus::Failed);

    assert_eq!(store.purge_task_history(250).unwrap(), 2);
    assert_eq!(store.task_history(&task.id, 10).unwrap().len(), 1);
}

#[test]
fn history_cascades_on_task_removal() {
    let store = store();
    let task = sample_task("t-1", TaskKind::OneTime, 100);
    store.insert_task(&task).unwrap();
    store
        .append_task_history(&task.id, 100, TaskHistoryStatus::Started, None)
        .unwrap();

    store.remove_task(&task.id).unwrap();
    assert!(store.task_history(&task.id, 10).unwrap().is_empty());
}

#[test]
fn list_filters_by_status() {
    let store = store();
    let pending = sample_task("p", TaskKind::OneTime, 100);
    let mut paused = sample_task("z", TaskKind::OneTime, 100);
    paused.status = TaskStatus::Paused;
    store.insert_task(&pending).unwrap();
    store.insert_task(&paused).unwrap();

    assert_eq!(store.list_tasks(None).unwrap().len(), 2);
    let only_paused = store.list_tasks(Some(TaskStatus::Paused)).unwrap();
    assert_eq!(only_paused.len(), 1);
    assert_eq!(only_paused[0].id, paused.id);
}

#[test]
fn next_pending_tasks_ordered_by_schedule() {
    let store = store();
    store.insert_task(&sample_task("b", TaskKind::OneTime, 500)).unwrap();
    store.insert_task(&sample_task("a", TaskKind::OneTime, 100)).unwrap();

    let next = store.next_pending_tasks(5).unwrap();
    assert_eq!(next[0].id, "a");
    assert_eq!(next[1].id, "b");
}
