// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session-init command: emit the text injected at assistant session
//! start.

use crate::context::Context;
use crate::output::print_json;
use anyhow::Result;
use clap::Args;
use warden_engine::session_init::{self, SessionInitConfig};
use warden_engine::status;

#[derive(Args, Debug)]
pub struct SessionInitArgs {
    /// Unsummarized-row count that triggers the memory-sync nudge.
    #[arg(long)]
    pub threshold: Option<i64>,
}

pub fn handle(ctx: &Context, args: &SessionInitArgs) -> Result<()> {
    let cfg = SessionInitConfig {
        identity_path: ctx.config.settings.identity_path.clone(),
        reference_paths: ctx.config.settings.reference_paths.clone(),
        sync_threshold: args
            .threshold
            .unwrap_or(ctx.config.settings.session_init_sync_threshold),
    };
    let current = status::read_status(&ctx.config.status_path);
    let text = session_init::render(&ctx.store, current.as_ref(), &cfg)?;

    if ctx.json {
        print_json(&serde_json::json!({ "text": text }))?;
    } else {
        print!("{text}");
    }
    Ok(())
}

#[cfg(test)]
#[path = "session_init_tests.rs"]
mod tests;
