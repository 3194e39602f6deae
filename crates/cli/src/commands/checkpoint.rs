// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Checkpoint commands.

use crate::context::Context;
use crate::output::print_json;
use anyhow::{bail, Result};
use clap::{Args, Subcommand};
use warden_core::{format_unix, Checkpoint};

#[derive(Args, Debug)]
pub struct CheckpointArgs {
    #[command(subcommand)]
    pub command: CheckpointCommand,
}

#[derive(Subcommand, Debug)]
pub enum CheckpointCommand {
    /// Mark conversations up to <end_id> as summarized.
    Create {
        end_id: i64,
        #[arg(long)]
        summary: Option<String>,
    },
    /// List checkpoints, newest first.
    List {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Show the latest checkpoint.
    Latest,
}

pub fn handle(ctx: &Context, command: &CheckpointCommand) -> Result<()> {
    match command {
        CheckpointCommand::Create { end_id, summary } => create(ctx, *end_id, summary.as_deref()),
        CheckpointCommand::List { limit } => list(ctx, *limit),
        CheckpointCommand::Latest => latest(ctx),
    }
}

fn create(ctx: &Context, end_id: i64, summary: Option<&str>) -> Result<()> {
    let max_id = ctx.store.max_conversation_id()?.unwrap_or(0);
    if end_id > max_id {
        bail!("end id {end_id} is beyond the newest conversation ({max_id})");
    }
    let checkpoint = ctx.store.create_checkpoint(end_id, summary, ctx.now())?;
    if ctx.json {
        print_json(&checkpoint)?;
    } else {
        print_checkpoint(&checkpoint);
    }
    Ok(())
}

fn list(ctx: &Context, limit: usize) -> Result<()> {
    let checkpoints = ctx.store.list_checkpoints(limit)?;
    if ctx.json {
        return print_json(&checkpoints);
    }
    if checkpoints.is_empty() {
        println!("no checkpoints");
        return Ok(());
    }
    for checkpoint in checkpoints {
        print_checkpoint(&checkpoint);
    }
    Ok(())
}

fn latest(ctx: &Context) -> Result<()> {
    match ctx.store.latest_checkpoint()? {
        Some(checkpoint) => {
            if ctx.json {
                print_json(&checkpoint)?;
            } else {
                print_checkpoint(&checkpoint);
            }
            Ok(())
        }
        None => bail!("no checkpoints yet"),
    }
}

fn print_checkpoint(checkpoint: &Checkpoint) {
    println!(
        "#{} [{}..{}] at {} {}",
        checkpoint.id,
        checkpoint.start_conversation_id,
        checkpoint.end_conversation_id,
        format_unix(checkpoint.created_at),
        checkpoint.summary.as_deref().unwrap_or("")
    );
}

#[cfg(test)]
#[path = "checkpoint_tests.rs"]
mod tests;
