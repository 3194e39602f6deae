// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use warden_adapters::{FakeChannelSender, FakePane, FakeProcessProbe};
use warden_core::{FakeClock, NewMessage};

struct Fixture {
    store: Arc<Store>,
    pane: FakePane,
    sender: FakeChannelSender,
    probe: FakeProcessProbe,
    clock: Arc<FakeClock>,
    guardian: Guardian<FakePane, FakeChannelSender, FakeProcessProbe>,
    status_path: PathBuf,
    pending_path: PathBuf,
    _dir: tempfile::TempDir,
}

fn fixture_with(transcript_dir: Option<PathBuf>) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let status_path = dir.path().join("status.json");
    let pending_path = dir.path().join("pending.jsonl");
    let store = Arc::new(Store::open_in_memory().unwrap());
    let pane = FakePane::with_live_session("warden-main");
    let sender = FakeChannelSender::new();
    let probe = FakeProcessProbe::new();
    let clock = Arc::new(FakeClock::at(100_000));

    let cfg = GuardianConfig {
        session: "warden-main".to_string(),
        assistant_cmd: "claude".to_string(),
        assistant_cwd: dir.path().to_path_buf(),
        process_pattern: "claude".to_string(),
        transcript_dir,
        status_path: status_path.clone(),
        pending_path: pending_path.clone(),
        activity_log_path: dir.path().join("activity.log"),
        idle_threshold: 10,
        restart_delay: 5,
        restart_grace: 30,
        stuck_after: 300,
        maintenance_patterns: vec!["warden-upgrade".to_string()],
        maintenance_wait_cap: 300,
        catch_up_prompt: "catch up on missed messages".to_string(),
        recovery_notice: "assistant is back online".to_string(),
    };

    let guardian = Guardian::new(
        Arc::clone(&store),
        pane.clone(),
        sender.clone(),
        probe.clone(),
        clock.clone(),
        cfg,
        HeartbeatConfig::default(),
    );

    Fixture {
        store,
        pane,
        sender,
        probe,
        clock,
        guardian,
        status_path,
        pending_path,
        _dir: dir,
    }
}

fn fixture() -> Fixture {
    let f = fixture_with(None);
    // Pretend a heartbeat just succeeded so ticks under test do not race
    // a primary probe.
    quiet_heartbeat(&f);
    f
}

fn quiet_heartbeat(f: &Fixture) {
    let mut state = f.store.supervisor_state().unwrap();
    state.last_heartbeat_at = f.clock.now();
    f.store.update_supervisor(&state, f.clock.now()).unwrap();
}

async fn tick(f: &mut Fixture) -> TickReport {
    f.guardian.tick().await.unwrap()
}

#[tokio::test]
async fn busy_and_idle_derivation() {
    let mut f = fixture();
    f.pane.set_activity_time(f.clock.now() - 3);

    let report = tick(&mut f).await;
    assert_eq!(report.state, AssistantState::Busy);

    let written = crate::status::read_status(&f.status_path).unwrap();
    assert_eq!(written.state, AssistantState::Busy);
    assert_eq!(written.idle_seconds, 3);
    assert_eq!(written.health, Health::Ok);

    // Quiet for longer than the idle threshold.
    f.clock.advance(60);
    let report = tick(&mut f).await;
    assert_eq!(report.state, AssistantState::Idle);
}

#[tokio::test]
async fn stopped_and_offline_derivation() {
    let mut f = fixture();
    f.pane.set_process_running(false);
    assert_eq!(tick(&mut f).await.state, AssistantState::Stopped);

    f.pane.remove_session();
    assert_eq!(tick(&mut f).await.state, AssistantState::Offline);
}

#[tokio::test]
async fn restart_after_sustained_absence() {
    let mut f = fixture();
    f.pane.remove_session();

    // Four not-running ticks: no restart yet.
    for _ in 0..4 {
        assert!(!tick(&mut f).await.restarted);
        f.clock.advance(1);
    }

    // Fifth tick restarts by creating the pane.
    let report = tick(&mut f).await;
    assert!(report.restarted);
    assert!(f.pane.has_session("warden-main").await.unwrap());

    // Catch-up is deferred until the grace window has passed.
    f.clock.advance(1);
    tick(&mut f).await;
    assert!(f.pane.pastes().is_empty());

    f.clock.advance(31);
    tick(&mut f).await;
    assert_eq!(f.pane.pastes(), vec!["catch up on missed messages".to_string()]);
}

#[tokio::test]
async fn restart_in_existing_pane_pastes_command() {
    let mut f = fixture();
    f.pane.set_process_running(false);

    for _ in 0..4 {
        tick(&mut f).await;
        f.clock.advance(1);
    }
    let report = tick(&mut f).await;
    assert!(report.restarted);
    assert_eq!(f.pane.pastes(), vec!["claude".to_string()]);
}

#[tokio::test]
async fn brief_blips_do_not_restart() {
    let mut f = fixture();
    f.pane.set_process_running(false);

    for _ in 0..3 {
        tick(&mut f).await;
        f.clock.advance(1);
    }
    // Process comes back: the counter resets.
    f.pane.set_process_running(true);
    tick(&mut f).await;
    f.pane.set_process_running(false);
    for _ in 0..4 {
        assert!(!tick(&mut f).await.restarted);
        f.clock.advance(1);
    }
}

#[tokio::test]
async fn maintenance_script_defers_restart_until_cap() {
    let mut f = fixture();
    f.pane.set_process_running(false);
    f.probe.set_matching(true);

    for _ in 0..10 {
        assert!(!tick(&mut f).await.restarted);
        f.clock.advance(1);
    }

    // Past the wait cap the restart proceeds anyway.
    f.clock.advance(301);
    quiet_heartbeat(&f);
    assert!(tick(&mut f).await.restarted);
}

#[tokio::test]
async fn maintenance_clearing_allows_restart() {
    let mut f = fixture();
    f.pane.set_process_running(false);
    f.probe.set_matching(true);

    for _ in 0..6 {
        tick(&mut f).await;
        f.clock.advance(1);
    }
    f.probe.set_matching(false);
    assert!(tick(&mut f).await.restarted);
}

#[tokio::test]
async fn heartbeat_timeout_kills_pane_and_degrades_health() {
    let mut f = fixture_with(None);
    // Heartbeat overdue: the first tick enqueues a primary probe.
    let report = tick(&mut f).await;
    assert_eq!(report.health, Health::Ok);

    // Past the ack deadline the probe times out: kill + recovering.
    f.clock.advance(200);
    let report = tick(&mut f).await;
    assert_eq!(report.health, Health::Recovering);
    assert_eq!(f.pane.kill_count(), 1);

    let written = crate::status::read_status(&f.status_path).unwrap();
    assert_eq!(written.health, Health::Recovering);
}

#[tokio::test]
async fn recovery_ack_restores_ok_and_notifies_pending_channels() {
    let mut f = fixture_with(None);
    // Refused channels waiting for a recovery notification.
    let pending = PendingChannels::new(&f.pending_path);
    pending.record("tg", Some("1")).unwrap();
    pending.record("slack", None).unwrap();

    tick(&mut f).await; // primary probe out
    f.clock.advance(200);
    tick(&mut f).await; // timeout -> recovering

    // After the backoff a recovery probe goes out; ack it.
    f.clock.advance(61);
    tick(&mut f).await;
    let probe = f.store.pending_heartbeat().unwrap().unwrap();
    f.store.ack_control(probe.id, f.clock.now()).unwrap();

    f.clock.advance(1);
    let report = tick(&mut f).await;
    assert_eq!(report.health, Health::Ok);

    let calls = f.sender.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].channel, "tg");
    assert_eq!(calls[0].content, "assistant is back online");
    assert!(pending.list().unwrap().is_empty());
}

#[tokio::test]
async fn rate_limited_pauses_restarts_and_reports_state() {
    let mut f = fixture();
    let engine = HeartbeatEngine::new(HeartbeatConfig::default());
    engine
        .signal_rate_limit(&f.store, f.clock.now(), Some(600))
        .unwrap();

    // Assistant dead, but no restart while rate limited.
    f.pane.remove_session();
    for _ in 0..10 {
        let report = tick(&mut f).await;
        assert!(!report.restarted);
        assert_eq!(report.state, AssistantState::RateLimited);
        f.clock.advance(1);
    }
    assert!(!f.pane.has_session("warden-main").await.unwrap());
}

#[tokio::test]
async fn stuck_probe_after_transcript_silence() {
    let dir = tempfile::tempdir().unwrap();
    let transcript_dir = dir.path().join("transcripts");
    std::fs::create_dir_all(&transcript_dir).unwrap();
    std::fs::write(transcript_dir.join("session.jsonl"), b"{}").unwrap();
    let file_mtime = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64;

    let mut f = fixture_with(Some(transcript_dir.clone()));
    quiet_heartbeat(&f);
    // Clock tracks real time so the transcript mtime lines up.
    f.clock.set(file_mtime + 400);
    quiet_heartbeat(&f);

    // Work was delivered after the last transcript write.
    let msg_id = f
        .store
        .insert_message(&NewMessage::new("tg", "hi"), file_mtime + 350)
        .unwrap();
    f.store.claim_conversation(msg_id).unwrap();
    f.store.mark_conversation_delivered(msg_id).unwrap();

    let report = tick(&mut f).await;
    let probe_id = report.stuck_probe.unwrap();
    let entry = f.store.control(probe_id).unwrap();
    assert_eq!(entry.channel, "heartbeat:stuck");

    // Same episode: no second probe even after the first resolves.
    f.store.ack_control(probe_id, f.clock.now()).unwrap();
    f.clock.advance(1);
    quiet_heartbeat(&f);
    let report = tick(&mut f).await;
    assert!(report.stuck_probe.is_none());
}

#[tokio::test]
async fn no_stuck_probe_without_delivered_work() {
    let dir = tempfile::tempdir().unwrap();
    let transcript_dir = dir.path().join("transcripts");
    std::fs::create_dir_all(&transcript_dir).unwrap();
    std::fs::write(transcript_dir.join("session.jsonl"), b"{}").unwrap();
    let file_mtime = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64;

    let mut f = fixture_with(Some(transcript_dir));
    f.clock.set(file_mtime + 400);
    quiet_heartbeat(&f);

    let report = tick(&mut f).await;
    assert!(report.stuck_probe.is_none());
}

#[tokio::test]
async fn status_file_is_written_every_tick() {
    let mut f = fixture();
    tick(&mut f).await;
    let first = crate::status::read_status(&f.status_path).unwrap();
    assert_eq!(first.updated_at, f.clock.now());

    f.clock.advance(5);
    tick(&mut f).await;
    let second = crate::status::read_status(&f.status_path).unwrap();
    assert_eq!(second.updated_at, f.clock.now());
}
