// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The health state machine.
//!
//! A pure transition function: given the current health and a probe
//! outcome (or a rate-limit signal), it returns the next health plus the
//! side effects the caller must perform. The heartbeat engine applies
//! transitions; the guardian executes the actions.

use warden_core::Health;

/// Consecutive recovery failures before giving up on kills.
pub const MAX_RECOVERY_FAILURES: i64 = 3;

/// Cap on the recovery backoff, seconds.
pub const RECOVERY_BACKOFF_CAP: i64 = 300;

/// Backoff before the next recovery probe: `min(fail_count * 60, cap)`.
pub fn recovery_backoff(fail_count: i64) -> i64 {
    (fail_count * 60).min(RECOVERY_BACKOFF_CAP)
}

/// Probe phases issued by the heartbeat engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeartbeatPhase {
    /// Periodic liveness probe while healthy.
    Primary,
    /// Probe issued on suspicion of a hang.
    Stuck,
    /// Probe verifying a restart worked.
    Recovery,
    /// Occasional retry while down.
    DownCheck,
    /// Occasional retry while rate-limited.
    RateLimitCheck,
}

impl HeartbeatPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            HeartbeatPhase::Primary => "primary",
            HeartbeatPhase::Stuck => "stuck",
            HeartbeatPhase::Recovery => "recovery",
            HeartbeatPhase::DownCheck => "down-check",
            HeartbeatPhase::RateLimitCheck => "rate-limit-check",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "primary" => Some(HeartbeatPhase::Primary),
            "stuck" => Some(HeartbeatPhase::Stuck),
            "recovery" => Some(HeartbeatPhase::Recovery),
            "down-check" => Some(HeartbeatPhase::DownCheck),
            "rate-limit-check" => Some(HeartbeatPhase::RateLimitCheck),
            _ => None,
        }
    }

    /// Control-queue channel tag for this phase.
    pub fn channel(&self) -> String {
        format!("heartbeat:{}", self.as_str())
    }

    pub fn from_channel(channel: &str) -> Option<Self> {
        channel.strip_prefix("heartbeat:").and_then(Self::parse)
    }

    /// The phase a probe must have to be meaningful under `health`.
    /// A pending probe of any other phase is superseded.
    pub fn expected_for(health: Health) -> &'static [HeartbeatPhase] {
        match health {
            Health::Ok => &[HeartbeatPhase::Primary, HeartbeatPhase::Stuck],
            Health::Recovering => &[HeartbeatPhase::Recovery],
            Health::Down => &[HeartbeatPhase::DownCheck],
            Health::RateLimited => &[HeartbeatPhase::RateLimitCheck],
        }
    }
}

impl std::fmt::Display for HeartbeatPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Input to the state machine.
#[derive(Debug, Clone)]
pub enum HealthEvent {
    ProbeSuccess(HeartbeatPhase),
    ProbeTimeout(HeartbeatPhase),
    /// Rate limit observed by the assistant and surfaced via the CLI.
    RateLimitSignal { reset_at: Option<i64> },
}

/// Side effects the caller must perform after a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthAction {
    /// Kill the assistant's pane session (idempotent).
    KillSession,
    /// Send a recovery notification to every pending channel, then clear
    /// the list.
    NotifyPendingChannels,
    /// Record when the rate limit is expected to lift.
    RecordRateLimitReset(Option<i64>),
}

/// Result of one transition.
#[derive(Debug, Clone)]
pub struct Transition {
    pub health: Health,
    pub fail_count: i64,
    pub actions: Vec<HealthAction>,
}

/// Advance the health machine by one event.
pub fn step(health: Health, fail_count: i64, event: &HealthEvent) -> Transition {
    match (health, event) {
        // Any successful probe from a degraded state restores service and
        // notifies the channels that were refused meanwhile.
        (Health::Recovering | Health::Down | Health::RateLimited, HealthEvent::ProbeSuccess(_)) => {
            Transition {
                health: Health::Ok,
                fail_count: 0,
                actions: vec![HealthAction::NotifyPendingChannels],
            }
        }
        (Health::Ok, HealthEvent::ProbeSuccess(_)) => Transition {
            health: Health::Ok,
            fail_count: 0,
            actions: Vec::new(),
        },

        // A primary or stuck probe timing out while ok goes straight to
        // recovery: kill the pane and let the guardian restart it.
        (Health::Ok, HealthEvent::ProbeTimeout(_)) => Transition {
            health: Health::Recovering,
            fail_count: 1,
            actions: vec![HealthAction::KillSession],
        },

        (Health::Recovering, HealthEvent::ProbeTimeout(_)) => {
            let failures = fail_count + 1;
            if failures >= MAX_RECOVERY_FAILURES {
                // Give up on kills; only the periodic down-check remains.
                Transition {
                    health: Health::Down,
                    fail_count: failures,
                    actions: Vec::new(),
                }
            } else {
                Transition {
                    health: Health::Recovering,
                    fail_count: failures,
                    actions: vec![HealthAction::KillSession],
                }
            }
        }

        // Down and rate-limited never kill; they just keep probing.
        (Health::Down, HealthEvent::ProbeTimeout(_)) => Transition {
            health: Health::Down,
            fail_count,
            actions: Vec::new(),
        },
        (Health::RateLimited, HealthEvent::ProbeTimeout(_)) => Transition {
            health: Health::RateLimited,
            fail_count,
            actions: Vec::new(),
        },

        (Health::Ok, HealthEvent::RateLimitSignal { reset_at }) => Transition {
            health: Health::RateLimited,
            fail_count,
            actions: vec![HealthAction::RecordRateLimitReset(*reset_at)],
        },
        // Already degraded: record the reset hint but stay put. Recovery
        // probes will sort out which state is real.
        (_, HealthEvent::RateLimitSignal { reset_at }) => Transition {
            health,
            fail_count,
            actions: vec![HealthAction::RecordRateLimitReset(*reset_at)],
        },
    }
}

#[cfg(test)]
#[path = "health_tests.rs"]
mod tests;
