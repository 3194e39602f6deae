// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ingress and egress operations behind the channel-adapter interface.
//!
//! `receive` persists an inbound message with a reply-routing suffix so
//! the assistant knows how to answer; while health is not ok the message
//! is refused and the channel recorded for a recovery notification.
//! `send` records an outbound row and hands the content to the
//! per-channel send executable.

use crate::pending::PendingChannels;
use crate::EngineError;
use warden_adapters::ChannelSender;
use warden_core::{Health, NewMessage, PRIORITY_NORMAL, PRIORITY_SYSTEM};
use warden_storage::Store;

/// CLI prefix channels are told to reply through.
pub const SEND_COMMAND: &str = "warden send";

#[derive(Debug, Clone)]
pub struct ReceiveRequest {
    pub channel: String,
    pub endpoint: Option<String>,
    pub content: String,
    pub priority: Option<i64>,
    /// Accept even while health is not ok.
    pub bypass_health: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReceiveOutcome {
    Accepted { id: i64 },
    /// Health is not ok; the channel was recorded for a recovery
    /// notification.
    Refused { health: Health },
}

/// Ingest a message from a channel adapter.
pub fn receive(
    store: &Store,
    pending: &PendingChannels,
    req: &ReceiveRequest,
    now: i64,
) -> Result<ReceiveOutcome, EngineError> {
    let health = store.health()?;
    if health != Health::Ok && !req.bypass_health {
        pending.record(&req.channel, req.endpoint.as_deref())?;
        tracing::warn!(
            channel = %req.channel,
            health = %health,
            "ingress refused while health is not ok"
        );
        return Ok(ReceiveOutcome::Refused { health });
    }

    let priority = req.priority.unwrap_or(PRIORITY_NORMAL);
    let msg = NewMessage {
        channel: req.channel.clone(),
        endpoint_id: req.endpoint.clone(),
        content: format_with_reply_route(&req.content, &req.channel, req.endpoint.as_deref()),
        priority,
        // Priority 1 means idle-required, always.
        require_idle: priority == PRIORITY_SYSTEM,
    };
    let id = store.insert_message(&msg, now)?;
    Ok(ReceiveOutcome::Accepted { id })
}

/// Append the reply-routing suffix a delivered message carries.
pub fn format_with_reply_route(body: &str, channel: &str, endpoint: Option<&str>) -> String {
    match endpoint {
        Some(endpoint) => format!("{body} ---- reply via: {SEND_COMMAND} {channel} {endpoint}"),
        None => format!("{body} ---- reply via: {SEND_COMMAND} {channel}"),
    }
}

/// Deliver content to an external channel, recording the outbound row.
pub async fn send<C: ChannelSender>(
    store: &Store,
    sender: &C,
    channel: &str,
    endpoint: Option<&str>,
    content: &str,
    now: i64,
) -> Result<i64, EngineError> {
    let id = store.insert_outbound(channel, endpoint, content, now)?;
    sender.send(channel, endpoint, content).await?;
    Ok(id)
}

#[cfg(test)]
#[path = "ingress_tests.rs"]
mod tests;
