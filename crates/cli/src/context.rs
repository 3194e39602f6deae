// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared command context.

use anyhow::Result;
use std::path::PathBuf;
use warden_core::{Clock, SystemClock};
use warden_daemon::Config;
use warden_storage::Store;

/// Everything a command handler needs.
pub struct Context {
    pub config: Config,
    pub store: Store,
    pub json: bool,
}

impl Context {
    /// Open the store at the configured (or overridden) state dir.
    pub fn open(state_dir: Option<PathBuf>, json: bool) -> Result<Self> {
        let config = match state_dir {
            Some(dir) => Config::load_from(dir)?,
            None => Config::load()?,
        };
        let store = Store::open(&config.db_path)?;
        Ok(Self {
            config,
            store,
            json,
        })
    }

    pub fn now(&self) -> i64 {
        SystemClock.now()
    }
}
