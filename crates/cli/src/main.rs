// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! warden - supervision CLI for the warden daemons

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use warden_cli::commands::{channel, checkpoint, control, session_init, task};
use warden_cli::Context;

#[derive(Parser)]
#[command(
    name = "warden",
    version,
    about = "warden - keeps an assistant alive, fed, and scheduled"
)]
struct Cli {
    /// Emit machine-readable JSON instead of text.
    #[arg(long, global = true)]
    json: bool,

    /// Override the state directory (default: $WARDEN_STATE_DIR or
    /// ~/.local/state/warden).
    #[arg(long, global = true, value_name = "DIR")]
    state_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest a message from a channel adapter.
    Receive(channel::ReceiveArgs),
    /// Deliver content to a channel adapter.
    Send(channel::SendArgs),
    /// Enqueue a supervision control entry.
    EnqueueControl(control::EnqueueControlArgs),
    /// Acknowledge a control entry (idempotent).
    AckControl(control::AckControlArgs),
    /// Show a control entry's status.
    GetControl(control::GetControlArgs),
    /// Surface a rate-limit signal observed by the assistant.
    RateLimit(control::RateLimitArgs),
    /// Scheduled task management.
    Task(task::TaskArgs),
    /// Conversation checkpoint management.
    Checkpoint(checkpoint::CheckpointArgs),
    /// Emit the assistant's session-start text.
    SessionInit(session_init::SessionInitArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let ctx = Context::open(cli.state_dir, cli.json)?;
    match cli.command {
        Commands::Receive(args) => channel::receive(&ctx, &args),
        Commands::Send(args) => channel::send(&ctx, &args).await,
        Commands::EnqueueControl(args) => control::enqueue(&ctx, &args),
        Commands::AckControl(args) => control::ack(&ctx, &args),
        Commands::GetControl(args) => control::get(&ctx, &args),
        Commands::RateLimit(args) => control::rate_limit(&ctx, &args),
        Commands::Task(args) => task::handle(&ctx, &args.command),
        Commands::Checkpoint(args) => checkpoint::handle(&ctx, &args.command),
        Commands::SessionInit(args) => session_init::handle(&ctx, &args),
    }
}
