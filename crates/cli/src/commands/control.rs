// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Control-queue commands: enqueue, ack, inspect.

use crate::context::Context;
use crate::output::print_json;
use anyhow::{bail, Result};
use clap::Args;
use warden_core::NewControl;
use warden_storage::AckOutcome;

#[derive(Args, Debug)]
pub struct EnqueueControlArgs {
    /// Text delivered to the assistant. May contain __CONTROL_ID__,
    /// replaced with the new entry's id.
    #[arg(long)]
    pub content: String,
    /// Lower number = higher priority (1 = idle-required).
    #[arg(long, default_value_t = 1)]
    pub priority: i64,
    /// Deliver only when the assistant has been idle for 5 s.
    #[arg(long)]
    pub require_idle: bool,
    /// Deliver regardless of current health state.
    #[arg(long)]
    pub bypass_state: bool,
    /// Seconds until the entry times out unacknowledged.
    #[arg(long, value_name = "SEC")]
    pub ack_deadline: Option<i64>,
    /// Delay delivery by this many seconds.
    #[arg(long, value_name = "SEC")]
    pub available_in: Option<i64>,
    /// Originator label recorded on the entry.
    #[arg(long, default_value = "system")]
    pub channel: String,
}

pub fn enqueue(ctx: &Context, args: &EnqueueControlArgs) -> Result<()> {
    if args.priority < 1 {
        bail!("priority must be >= 1");
    }
    let now = ctx.now();
    let mut ctl = NewControl::new(&args.channel, &args.content)
        .priority(args.priority)
        .require_idle(args.require_idle)
        .bypass_state(args.bypass_state);
    if let Some(secs) = args.ack_deadline {
        ctl = ctl.ack_deadline_at(now + secs);
    }
    if let Some(secs) = args.available_in {
        ctl = ctl.available_at(now + secs);
    }

    let id = ctx.store.enqueue_control(&ctl, now)?;
    if ctx.json {
        print_json(&serde_json::json!({ "id": id }))?;
    } else {
        println!("{id}");
    }
    Ok(())
}

#[derive(Args, Debug)]
pub struct AckControlArgs {
    /// Control entry id.
    #[arg(long)]
    pub id: i64,
}

pub fn ack(ctx: &Context, args: &AckControlArgs) -> Result<()> {
    let outcome = ctx.store.ack_control(args.id, ctx.now())?;
    let status = match outcome {
        AckOutcome::Done => "done".to_string(),
        AckOutcome::Timeout => "timeout".to_string(),
        AckOutcome::AlreadyTerminal(status) => status.to_string(),
    };
    if ctx.json {
        print_json(&serde_json::json!({ "id": args.id, "status": status }))?;
    } else {
        println!("{status}");
    }
    Ok(())
}

#[derive(Args, Debug)]
pub struct GetControlArgs {
    /// Control entry id.
    #[arg(long)]
    pub id: i64,
}

pub fn get(ctx: &Context, args: &GetControlArgs) -> Result<()> {
    let entry = ctx.store.control(args.id)?;
    // Inspectors see an expired pending entry as timed out even before
    // the reaper converts it.
    let effective = entry.effective_status(ctx.now());
    if ctx.json {
        let mut value = serde_json::to_value(&entry)?;
        value["status"] = serde_json::json!(effective);
        print_json(&value)?;
    } else {
        println!("{effective}");
    }
    Ok(())
}

#[derive(Args, Debug)]
pub struct RateLimitArgs {
    /// Seconds until the limit is expected to lift.
    #[arg(long, value_name = "SEC")]
    pub reset_in: Option<i64>,
}

/// Surface a rate-limit signal observed by the assistant.
pub fn rate_limit(ctx: &Context, args: &RateLimitArgs) -> Result<()> {
    let engine = warden_engine::heartbeat::HeartbeatEngine::new(heartbeat_config(ctx));
    engine.signal_rate_limit(&ctx.store, ctx.now(), args.reset_in)?;
    let health = ctx.store.health()?;
    if ctx.json {
        print_json(&serde_json::json!({ "health": health }))?;
    } else {
        println!("health: {health}");
    }
    Ok(())
}

fn heartbeat_config(ctx: &Context) -> warden_engine::heartbeat::HeartbeatConfig {
    warden_engine::heartbeat::HeartbeatConfig {
        primary_interval: ctx.config.settings.heartbeat_interval_secs,
        ack_deadline: ctx.config.settings.heartbeat_ack_deadline_secs,
        down_retry_interval: ctx.config.settings.down_retry_interval_secs,
        rate_limit_probe_interval: ctx.config.settings.rate_limit_probe_interval_secs,
        ..warden_engine::heartbeat::HeartbeatConfig::default()
    }
}

#[cfg(test)]
#[path = "control_tests.rs"]
mod tests;
