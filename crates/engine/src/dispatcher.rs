// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The dispatcher: drain both queues in priority order and deliver each
//! entry to the assistant pane exactly once.
//!
//! Controls take precedence over conversations at the same numeric
//! priority. Priority-1 and idle-required entries wait for the idle gate;
//! lower priorities may overtake them. A missing or malformed status file
//! counts as idle (fail-open) so a dead guardian cannot deadlock
//! delivery.

use crate::status;
use crate::EngineError;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use warden_adapters::PaneController;
use warden_core::{Clock, ControlEntry, Conversation, Health};
use warden_storage::Store;

/// Poll interval while the queues are empty.
pub const POLL_INTERVAL_IDLE: Duration = Duration::from_millis(500);
/// Poll interval immediately after a successful delivery.
pub const POLL_INTERVAL_ACTIVE: Duration = Duration::from_millis(100);

/// Delivery attempts before a conversation is marked failed.
pub const MAX_DELIVERY_ATTEMPTS: i64 = 5;

#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Tmux session hosting the assistant.
    pub session: String,
    pub status_path: PathBuf,
    pub max_delivery_attempts: i64,
}

impl DispatcherConfig {
    pub fn new(session: impl Into<String>, status_path: impl Into<PathBuf>) -> Self {
        Self {
            session: session.into(),
            status_path: status_path.into(),
            max_delivery_attempts: MAX_DELIVERY_ATTEMPTS,
        }
    }
}

/// What one poll accomplished. Decides the next poll delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Something was pasted into the pane.
    Delivered,
    /// Nothing deliverable.
    Empty,
    /// The pane does not exist; the guardian owns creating it.
    PaneMissing,
}

impl PollOutcome {
    pub fn next_delay(&self) -> Duration {
        match self {
            PollOutcome::Delivered => POLL_INTERVAL_ACTIVE,
            PollOutcome::Empty | PollOutcome::PaneMissing => POLL_INTERVAL_IDLE,
        }
    }
}

enum Candidate {
    Control(ControlEntry),
    Conversation(Conversation),
}

pub struct Dispatcher<P: PaneController> {
    store: Arc<Store>,
    pane: P,
    clock: Arc<dyn Clock>,
    cfg: DispatcherConfig,
}

impl<P: PaneController> Dispatcher<P> {
    pub fn new(store: Arc<Store>, pane: P, clock: Arc<dyn Clock>, cfg: DispatcherConfig) -> Self {
        Self {
            store,
            pane,
            clock,
            cfg,
        }
    }

    /// One poll: reap expired controls, pick the best deliverable entry
    /// across both queues, claim it, paste it.
    pub async fn poll_once(&self) -> Result<PollOutcome, EngineError> {
        let now = self.clock.now();

        let status = status::read_status(&self.cfg.status_path);
        let idle = match &status {
            Some(s) => s.is_idle(),
            None => {
                tracing::debug!("status file missing or malformed; assuming idle (fail-open)");
                true
            }
        };
        let health_ok = status.map(|s| s.health == Health::Ok).unwrap_or(true);

        if !self.pane.has_session(&self.cfg.session).await? {
            tracing::debug!(session = %self.cfg.session, "pane missing; skipping poll cycle");
            return Ok(PollOutcome::PaneMissing);
        }

        let expired = self.store.expire_overdue_controls(now)?;
        if expired > 0 {
            tracing::info!(expired, "control entries timed out before delivery");
        }

        let control = self.store.peek_next_control(now, idle, health_ok)?;
        let conversation = self.store.peek_next_inbound(idle)?;

        let candidate = match (control, conversation) {
            // Strictly better priority wins; controls win ties.
            (Some(ctl), Some(conv)) if conv.priority < ctl.priority => {
                Candidate::Conversation(conv)
            }
            (Some(ctl), _) => Candidate::Control(ctl),
            (None, Some(conv)) => Candidate::Conversation(conv),
            (None, None) => return Ok(PollOutcome::Empty),
        };

        match candidate {
            Candidate::Control(entry) => self.deliver_control(entry, now).await,
            Candidate::Conversation(conv) => self.deliver_conversation(conv).await,
        }
    }

    async fn deliver_control(
        &self,
        entry: ControlEntry,
        now: i64,
    ) -> Result<PollOutcome, EngineError> {
        if !self.store.claim_control(entry.id)? {
            // Lost the claim race; resolved on the next poll.
            return Ok(PollOutcome::Empty);
        }

        match self.pane.paste_and_enter(&self.cfg.session, &entry.content).await {
            Ok(()) => {
                tracing::info!(control_id = entry.id, channel = %entry.channel, "control delivered");
                // Fire-and-forget controls are finished on paste; acked
                // ones stay running until the ack or the deadline reaper.
                if entry.ack_deadline_at.is_none() {
                    self.store.ack_control(entry.id, now)?;
                }
                Ok(PollOutcome::Delivered)
            }
            Err(e) => {
                let retries = self.store.release_control(entry.id, &e.to_string())?;
                tracing::warn!(control_id = entry.id, error = %e, retries, "control paste failed");
                if retries >= self.cfg.max_delivery_attempts {
                    self.store.fail_control(entry.id, "delivery retries exhausted")?;
                }
                Ok(PollOutcome::Empty)
            }
        }
    }

    async fn deliver_conversation(&self, conv: Conversation) -> Result<PollOutcome, EngineError> {
        if !self.store.claim_conversation(conv.id)? {
            return Ok(PollOutcome::Empty);
        }

        match self.pane.paste_and_enter(&self.cfg.session, &conv.content).await {
            Ok(()) => {
                self.store.mark_conversation_delivered(conv.id)?;
                tracing::info!(
                    conversation_id = conv.id,
                    channel = %conv.channel,
                    "conversation delivered"
                );
                Ok(PollOutcome::Delivered)
            }
            Err(e) => {
                let retries = self.store.release_conversation(conv.id)?;
                tracing::warn!(
                    conversation_id = conv.id,
                    error = %e,
                    retries,
                    "conversation paste failed"
                );
                if retries >= self.cfg.max_delivery_attempts {
                    self.store.fail_conversation(conv.id)?;
                }
                Ok(PollOutcome::Empty)
            }
        }
    }
}

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod tests;
