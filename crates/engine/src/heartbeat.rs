// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The heartbeat engine.
//!
//! Probes transit the full pane path: a control entry is enqueued, the
//! dispatcher pastes it, the assistant acks by CLI back into the control
//! queue, and this engine observes the outcome on the next guardian
//! tick. A timed-out probe drives the health machine; a successful one
//! proves end-to-end liveness.
//!
//! At most one probe is in flight at any time. The in-flight probe's
//! control id and phase live in the supervisor row so they survive
//! guardian restarts.

use crate::health::{self, HealthAction, HealthEvent, HeartbeatPhase, Transition};
use crate::EngineError;
use warden_core::{ControlStatus, Health, NewControl, CONTROL_ID_PLACEHOLDER, PRIORITY_URGENT};
use warden_storage::{Store, StorageError, SupervisorState};

/// Heartbeat engine tuning.
#[derive(Debug, Clone)]
pub struct HeartbeatConfig {
    /// Seconds between primary probes while healthy.
    pub primary_interval: i64,
    /// Seconds a probe has to be acknowledged.
    pub ack_deadline: i64,
    /// Seconds between down-check probes.
    pub down_retry_interval: i64,
    /// Seconds between rate-limit probes.
    pub rate_limit_probe_interval: i64,
    /// CLI prefix the assistant runs to ack, completed with the control id.
    pub ack_command: String,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            primary_interval: 7200,
            ack_deadline: 180,
            down_retry_interval: 1800,
            rate_limit_probe_interval: 300,
            ack_command: "warden ack-control --id".to_string(),
        }
    }
}

/// Outcome of one engine tick.
#[derive(Debug)]
pub struct HeartbeatTick {
    pub health_before: Health,
    pub health_after: Health,
    /// Side effects the caller must perform (kills, notifications).
    pub actions: Vec<HealthAction>,
    /// Probe enqueued this tick, if any.
    pub enqueued: Option<(i64, HeartbeatPhase)>,
}

impl HeartbeatTick {
    pub fn health_changed(&self) -> bool {
        self.health_before != self.health_after
    }
}

pub struct HeartbeatEngine {
    cfg: HeartbeatConfig,
}

impl HeartbeatEngine {
    pub fn new(cfg: HeartbeatConfig) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &HeartbeatConfig {
        &self.cfg
    }

    /// Advance the engine: resolve the in-flight probe if it reached a
    /// terminal state, clear a probe superseded by a health change, and
    /// enqueue the next probe when one is due.
    pub fn tick(&self, store: &Store, now: i64) -> Result<HeartbeatTick, EngineError> {
        let mut state = store.supervisor_state()?;
        let health_before = state.health;
        let mut actions = Vec::new();

        // Resolve the in-flight probe.
        if let Some(id) = state.inflight_control_id {
            let phase = state
                .inflight_phase
                .as_deref()
                .and_then(HeartbeatPhase::parse)
                .unwrap_or(HeartbeatPhase::Primary);

            let observed = match store.control(id) {
                Ok(entry) => Some(entry.effective_status(now)),
                Err(StorageError::NotFound(_)) => None,
                Err(e) => return Err(e.into()),
            };

            let event = match observed {
                Some(ControlStatus::Done) => Some(HealthEvent::ProbeSuccess(phase)),
                // A failed or vanished probe is indistinguishable from an
                // unresponsive assistant.
                Some(ControlStatus::Timeout) | Some(ControlStatus::Failed) | None => {
                    Some(HealthEvent::ProbeTimeout(phase))
                }
                Some(ControlStatus::Pending) | Some(ControlStatus::Running) => None,
            };

            if let Some(event) = event {
                let success = matches!(event, HealthEvent::ProbeSuccess(_));
                let t = health::step(state.health, state.fail_count, &event);
                tracing::info!(
                    probe = %phase,
                    from = %state.health,
                    to = %t.health,
                    success,
                    "heartbeat probe resolved"
                );
                apply_transition(&mut state, &t);
                if success {
                    state.last_heartbeat_at = now;
                }
                state.inflight_control_id = None;
                state.inflight_phase = None;
                state.last_probe_at = now;
                actions.extend(t.actions);
            }
        }

        // Clear a pending probe whose phase no longer matches health.
        self.clear_superseded_probe(store, &mut state)?;

        // Enqueue the next probe when due.
        let mut enqueued = None;
        if state.inflight_control_id.is_none() {
            if let Some(phase) = self.due_phase(&state, now) {
                let id = self.enqueue_probe(store, phase, None, now)?;
                state.inflight_control_id = Some(id);
                state.inflight_phase = Some(phase.as_str().to_string());
                state.last_probe_at = now;
                enqueued = Some((id, phase));
            }
        }

        store.update_supervisor(&state, now)?;
        Ok(HeartbeatTick {
            health_before,
            health_after: state.health,
            actions,
            enqueued,
        })
    }

    /// Issue a stuck probe immediately. No-op unless health is ok and no
    /// probe is already in flight.
    pub fn request_stuck_probe(
        &self,
        store: &Store,
        now: i64,
        reason: &str,
    ) -> Result<Option<i64>, EngineError> {
        let mut state = store.supervisor_state()?;
        if state.health != Health::Ok || state.inflight_control_id.is_some() {
            return Ok(None);
        }
        tracing::warn!(reason, "requesting stuck probe");
        let id = self.enqueue_probe(store, HeartbeatPhase::Stuck, Some(reason), now)?;
        state.inflight_control_id = Some(id);
        state.inflight_phase = Some(HeartbeatPhase::Stuck.as_str().to_string());
        state.last_probe_at = now;
        store.update_supervisor(&state, now)?;
        Ok(Some(id))
    }

    /// Record a rate-limit signal surfaced by the assistant. Returns the
    /// actions the caller must perform (never a kill).
    pub fn signal_rate_limit(
        &self,
        store: &Store,
        now: i64,
        reset_in: Option<i64>,
    ) -> Result<Vec<HealthAction>, EngineError> {
        let mut state = store.supervisor_state()?;
        let reset_at = reset_in.map(|secs| now + secs);
        let t = health::step(
            state.health,
            state.fail_count,
            &HealthEvent::RateLimitSignal { reset_at },
        );
        tracing::warn!(from = %state.health, to = %t.health, ?reset_at, "rate limit signaled");
        apply_transition(&mut state, &t);
        // Hold off probing until the reset hint or the probe interval.
        state.last_probe_at = now;
        self.clear_superseded_probe(store, &mut state)?;
        store.update_supervisor(&state, now)?;
        Ok(t.actions)
    }

    fn clear_superseded_probe(
        &self,
        store: &Store,
        state: &mut SupervisorState,
    ) -> Result<(), EngineError> {
        if state.inflight_control_id.is_none() {
            return Ok(());
        }
        let expected = HeartbeatPhase::expected_for(state.health);
        let matches_phase = state
            .inflight_phase
            .as_deref()
            .and_then(HeartbeatPhase::parse)
            .is_some_and(|p| expected.contains(&p));
        if !matches_phase {
            store.clear_pending_heartbeats("superseded by health change")?;
            state.inflight_control_id = None;
            state.inflight_phase = None;
        }
        Ok(())
    }

    fn due_phase(&self, state: &SupervisorState, now: i64) -> Option<HeartbeatPhase> {
        match state.health {
            Health::Ok => (now - state.last_heartbeat_at >= self.cfg.primary_interval)
                .then_some(HeartbeatPhase::Primary),
            Health::Recovering => {
                let backoff = health::recovery_backoff(state.fail_count);
                (now - state.last_probe_at >= backoff).then_some(HeartbeatPhase::Recovery)
            }
            Health::Down => (now - state.last_probe_at >= self.cfg.down_retry_interval)
                .then_some(HeartbeatPhase::DownCheck),
            Health::RateLimited => {
                let mut due_at = state.last_probe_at + self.cfg.rate_limit_probe_interval;
                if let Some(reset) = state.rate_limit_reset_at {
                    if reset > state.last_probe_at {
                        due_at = due_at.min(reset);
                    }
                }
                (now >= due_at).then_some(HeartbeatPhase::RateLimitCheck)
            }
        }
    }

    fn enqueue_probe(
        &self,
        store: &Store,
        phase: HeartbeatPhase,
        reason: Option<&str>,
        now: i64,
    ) -> Result<i64, EngineError> {
        // Probes while degraded must bypass health gating or they would
        // never be delivered.
        let bypass = !matches!(phase, HeartbeatPhase::Primary | HeartbeatPhase::Stuck);
        let ctl = NewControl::new(phase.channel(), probe_content(phase, reason, &self.cfg.ack_command))
            .priority(PRIORITY_URGENT)
            .bypass_state(bypass)
            .ack_deadline_at(now + self.cfg.ack_deadline);
        let id = store.enqueue_control(&ctl, now)?;
        tracing::info!(control_id = id, probe = %phase, "heartbeat probe enqueued");
        Ok(id)
    }
}

fn apply_transition(state: &mut SupervisorState, t: &Transition) {
    state.health = t.health;
    state.fail_count = t.fail_count;
    for action in &t.actions {
        match action {
            HealthAction::RecordRateLimitReset(reset) => state.rate_limit_reset_at = *reset,
            HealthAction::NotifyPendingChannels => state.rate_limit_reset_at = None,
            HealthAction::KillSession => {}
        }
    }
}

fn probe_content(phase: HeartbeatPhase, reason: Option<&str>, ack_command: &str) -> String {
    let preamble = match phase {
        HeartbeatPhase::Primary => "Heartbeat check.".to_string(),
        HeartbeatPhase::Stuck => match reason {
            Some(reason) => format!("Liveness check ({reason})."),
            None => "Liveness check.".to_string(),
        },
        HeartbeatPhase::Recovery => "Recovery check after a restart.".to_string(),
        HeartbeatPhase::DownCheck => "Availability check.".to_string(),
        HeartbeatPhase::RateLimitCheck => "Rate-limit check.".to_string(),
    };
    format!("{preamble} Confirm you are responsive by running: {ack_command} {CONTROL_ID_PLACEHOLDER}")
}

#[cfg(test)]
#[path = "heartbeat_tests.rs"]
mod tests;
