// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::status::write_status;
use warden_adapters::FakePane;
use warden_core::{
    AssistantState, ControlStatus, ConversationStatus, FakeClock, NewControl, NewMessage,
    StatusFile, PRIORITY_NORMAL, PRIORITY_SYSTEM,
};

struct Fixture {
    store: Arc<Store>,
    pane: FakePane,
    clock: Arc<FakeClock>,
    dispatcher: Dispatcher<FakePane>,
    status_path: PathBuf,
    _dir: tempfile::TempDir,
}

fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let status_path = dir.path().join("status.json");
    let store = Arc::new(Store::open_in_memory().unwrap());
    let pane = FakePane::with_live_session("warden-main");
    let clock = Arc::new(FakeClock::at(1_000));
    let dispatcher = Dispatcher::new(
        Arc::clone(&store),
        pane.clone(),
        clock.clone(),
        DispatcherConfig::new("warden-main", &status_path),
    );
    Fixture {
        store,
        pane,
        clock,
        dispatcher,
        status_path,
        _dir: dir,
    }
}

fn write_state(f: &Fixture, state: AssistantState, idle_seconds: i64) {
    write_status(
        &f.status_path,
        &StatusFile {
            state,
            health: Health::Ok,
            idle_seconds,
            last_activity: 900,
            pid: None,
            updated_at: 1_000,
        },
    )
    .unwrap();
}

#[tokio::test]
async fn delivers_pending_conversation() {
    let f = fixture();
    write_state(&f, AssistantState::Idle, 60);
    let id = f
        .store
        .insert_message(&NewMessage::new("tg", "hi ---- reply via: warden send tg 1"), 999)
        .unwrap();

    let outcome = f.dispatcher.poll_once().await.unwrap();
    assert_eq!(outcome, PollOutcome::Delivered);
    assert_eq!(outcome.next_delay(), POLL_INTERVAL_ACTIVE);

    assert_eq!(
        f.store.conversation(id).unwrap().status,
        ConversationStatus::Delivered
    );
    assert_eq!(
        f.pane.pastes(),
        vec!["hi ---- reply via: warden send tg 1".to_string()]
    );
}

#[tokio::test]
async fn empty_queues_yield_empty() {
    let f = fixture();
    write_state(&f, AssistantState::Idle, 60);
    let outcome = f.dispatcher.poll_once().await.unwrap();
    assert_eq!(outcome, PollOutcome::Empty);
    assert_eq!(outcome.next_delay(), POLL_INTERVAL_IDLE);
}

#[tokio::test]
async fn missing_pane_aborts_cycle_without_claiming() {
    let f = fixture();
    write_state(&f, AssistantState::Idle, 60);
    f.pane.remove_session();
    let id = f.store.insert_message(&NewMessage::new("tg", "hi"), 999).unwrap();

    let outcome = f.dispatcher.poll_once().await.unwrap();
    assert_eq!(outcome, PollOutcome::PaneMissing);
    assert_eq!(
        f.store.conversation(id).unwrap().status,
        ConversationStatus::Pending
    );
}

#[tokio::test]
async fn missing_status_file_fails_open_as_idle() {
    let f = fixture();
    // No status file written at all.
    let id = f
        .store
        .insert_message(
            &NewMessage::new("system", "gated").priority(PRIORITY_SYSTEM),
            999,
        )
        .unwrap();

    let outcome = f.dispatcher.poll_once().await.unwrap();
    assert_eq!(outcome, PollOutcome::Delivered);
    assert_eq!(
        f.store.conversation(id).unwrap().status,
        ConversationStatus::Delivered
    );
}

#[tokio::test]
async fn priority_one_waits_for_idle_and_lower_overtakes() {
    let f = fixture();
    write_state(&f, AssistantState::Busy, 0);

    let gated = f
        .store
        .insert_message(&NewMessage::new("system", "/context").priority(PRIORITY_SYSTEM), 10)
        .unwrap();
    let normal = f
        .store
        .insert_message(&NewMessage::new("tg", "hello").priority(PRIORITY_NORMAL), 11)
        .unwrap();

    // Busy: the priority-3 message overtakes the gated priority-1 entry.
    assert_eq!(f.dispatcher.poll_once().await.unwrap(), PollOutcome::Delivered);
    assert_eq!(
        f.store.conversation(normal).unwrap().status,
        ConversationStatus::Delivered
    );
    assert_eq!(
        f.store.conversation(gated).unwrap().status,
        ConversationStatus::Pending
    );

    // Once idle >= 5s the gated entry is delivered.
    write_state(&f, AssistantState::Busy, 6);
    assert_eq!(f.dispatcher.poll_once().await.unwrap(), PollOutcome::Delivered);
    assert_eq!(
        f.store.conversation(gated).unwrap().status,
        ConversationStatus::Delivered
    );
}

#[tokio::test]
async fn control_beats_conversation_at_same_priority() {
    let f = fixture();
    write_state(&f, AssistantState::Idle, 60);

    f.store
        .insert_message(&NewMessage::new("tg", "conv").priority(2), 10)
        .unwrap();
    let ctl = f
        .store
        .enqueue_control(&NewControl::new("system", "ctl").priority(2), 11)
        .unwrap();

    assert_eq!(f.dispatcher.poll_once().await.unwrap(), PollOutcome::Delivered);
    assert_eq!(f.pane.pastes(), vec!["ctl".to_string()]);
    // Fire-and-forget control (no deadline) completes on paste.
    assert_eq!(f.store.control(ctl).unwrap().status, ControlStatus::Done);
}

#[tokio::test]
async fn conversation_with_better_priority_beats_control() {
    let f = fixture();
    write_state(&f, AssistantState::Idle, 60);

    f.store
        .enqueue_control(&NewControl::new("system", "ctl").priority(3), 10)
        .unwrap();
    f.store
        .insert_message(&NewMessage::new("tg", "urgent").priority(2), 11)
        .unwrap();

    f.dispatcher.poll_once().await.unwrap();
    assert_eq!(f.pane.pastes(), vec!["urgent".to_string()]);
}

#[tokio::test]
async fn expired_control_times_out_without_delivery() {
    let f = fixture();
    write_state(&f, AssistantState::Idle, 60);
    f.clock.set(2_000);

    let ctl = f
        .store
        .enqueue_control(&NewControl::new("system", "late").ack_deadline_at(1_500), 100)
        .unwrap();

    assert_eq!(f.dispatcher.poll_once().await.unwrap(), PollOutcome::Empty);
    assert_eq!(f.store.control(ctl).unwrap().status, ControlStatus::Timeout);
    assert!(f.pane.pastes().is_empty());
}

#[tokio::test]
async fn delayed_control_waits_for_available_at() {
    let f = fixture();
    write_state(&f, AssistantState::Idle, 60);

    let ctl = f
        .store
        .enqueue_control(&NewControl::new("system", "later").available_at(5_000), 100)
        .unwrap();

    assert_eq!(f.dispatcher.poll_once().await.unwrap(), PollOutcome::Empty);

    f.clock.set(5_000);
    assert_eq!(f.dispatcher.poll_once().await.unwrap(), PollOutcome::Delivered);
    assert_eq!(f.store.control(ctl).unwrap().status, ControlStatus::Done);
}

#[tokio::test]
async fn control_with_deadline_stays_running_until_ack() {
    let f = fixture();
    write_state(&f, AssistantState::Idle, 60);

    let ctl = f
        .store
        .enqueue_control(&NewControl::new("heartbeat:primary", "probe").ack_deadline_at(9_000), 100)
        .unwrap();

    assert_eq!(f.dispatcher.poll_once().await.unwrap(), PollOutcome::Delivered);
    assert_eq!(f.store.control(ctl).unwrap().status, ControlStatus::Running);
}

#[tokio::test]
async fn bypass_control_is_delivered_while_health_degraded() {
    let f = fixture();
    write_status(
        &f.status_path,
        &StatusFile {
            state: AssistantState::Idle,
            health: Health::Recovering,
            idle_seconds: 60,
            last_activity: 900,
            pid: None,
            updated_at: 1_000,
        },
    )
    .unwrap();

    let gated = f
        .store
        .enqueue_control(&NewControl::new("system", "normal"), 10)
        .unwrap();
    f.store
        .enqueue_control(&NewControl::new("heartbeat:recovery", "probe").bypass_state(true), 11)
        .unwrap();

    f.dispatcher.poll_once().await.unwrap();
    assert_eq!(f.pane.pastes(), vec!["probe".to_string()]);
    assert_eq!(f.store.control(gated).unwrap().status, ControlStatus::Pending);
}

#[tokio::test]
async fn transport_failure_reverts_and_eventually_fails() {
    let f = fixture();
    write_state(&f, AssistantState::Idle, 60);
    f.pane.fail_pastes("tmux exploded");

    let id = f.store.insert_message(&NewMessage::new("tg", "hi"), 999).unwrap();

    for attempt in 1..MAX_DELIVERY_ATTEMPTS {
        assert_eq!(f.dispatcher.poll_once().await.unwrap(), PollOutcome::Empty);
        let conv = f.store.conversation(id).unwrap();
        assert_eq!(conv.status, ConversationStatus::Pending);
        assert_eq!(conv.retry_count, attempt);
    }

    // Final attempt exhausts the ceiling.
    assert_eq!(f.dispatcher.poll_once().await.unwrap(), PollOutcome::Empty);
    assert_eq!(
        f.store.conversation(id).unwrap().status,
        ConversationStatus::Failed
    );
}

#[tokio::test]
async fn delivery_is_exactly_once_per_entry() {
    let f = fixture();
    write_state(&f, AssistantState::Idle, 60);
    f.store.insert_message(&NewMessage::new("tg", "only once"), 999).unwrap();

    assert_eq!(f.dispatcher.poll_once().await.unwrap(), PollOutcome::Delivered);
    assert_eq!(f.dispatcher.poll_once().await.unwrap(), PollOutcome::Empty);
    assert_eq!(f.pane.pastes().len(), 1);
}
