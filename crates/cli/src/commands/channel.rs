// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Channel-adapter surface: `receive` (ingress) and `send` (egress).

use crate::context::Context;
use crate::output::print_json;
use anyhow::{bail, Result};
use clap::Args;
use warden_adapters::SkillChannelSender;
use warden_engine::ingress::{self, ReceiveOutcome, ReceiveRequest};
use warden_engine::pending::PendingChannels;

#[derive(Args, Debug)]
pub struct ReceiveArgs {
    /// Source channel (adapter id).
    pub channel: String,
    /// Per-channel addressee.
    pub endpoint: String,
    /// Message body.
    pub content: String,
    /// Lower number = higher priority (default 3).
    #[arg(long)]
    pub priority: Option<i64>,
    /// Accept even while health is not ok.
    #[arg(long)]
    pub bypass_state: bool,
}

pub fn receive(ctx: &Context, args: &ReceiveArgs) -> Result<()> {
    if let Some(priority) = args.priority {
        if priority < 1 {
            bail!("priority must be >= 1");
        }
    }
    let pending = PendingChannels::new(&ctx.config.pending_path);
    let req = ReceiveRequest {
        channel: args.channel.clone(),
        endpoint: Some(args.endpoint.clone()),
        content: args.content.clone(),
        priority: args.priority,
        bypass_health: args.bypass_state,
    };

    match ingress::receive(&ctx.store, &pending, &req, ctx.now())? {
        ReceiveOutcome::Accepted { id } => {
            if ctx.json {
                print_json(&serde_json::json!({ "id": id, "accepted": true }))?;
            } else {
                println!("{id}");
            }
            Ok(())
        }
        ReceiveOutcome::Refused { health } => {
            if ctx.json {
                print_json(&serde_json::json!({ "accepted": false, "health": health }))?;
            }
            bail!(
                "assistant unavailable (health: {health}); \
                 the channel will be notified on recovery"
            );
        }
    }
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Target channel.
    pub channel: String,
    /// `[endpoint] content` — endpoint may be omitted for broadcast
    /// channels.
    #[arg(num_args = 1..=2, value_name = "ARGS")]
    pub rest: Vec<String>,
}

impl SendArgs {
    /// Split the trailing arguments into (endpoint, content).
    pub fn parts(&self) -> Result<(Option<&str>, &str)> {
        match self.rest.as_slice() {
            [content] => Ok((None, content.as_str())),
            [endpoint, content] => Ok((Some(endpoint.as_str()), content.as_str())),
            _ => bail!("usage: warden send <channel> [endpoint] <content>"),
        }
    }
}

pub async fn send(ctx: &Context, args: &SendArgs) -> Result<()> {
    let (endpoint, content) = args.parts()?;
    let sender = SkillChannelSender::new(ctx.config.skills_dir());
    let id = ingress::send(&ctx.store, &sender, &args.channel, endpoint, content, ctx.now()).await?;

    if ctx.json {
        print_json(&serde_json::json!({ "id": id, "delivered": true }))?;
    } else {
        println!("delivered ({id})");
    }
    Ok(())
}

#[cfg(test)]
#[path = "channel_tests.rs"]
mod tests;
