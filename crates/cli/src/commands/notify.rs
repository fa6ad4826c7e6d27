// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use anyhow::{Context, Result};
use az_core::{SignalFile, TaskId};
use clap::Args;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Args)]
pub struct NotifyArgs {
    /// Event name (e.g. `stop`, `permission`)
    pub event: String,
    /// Task the event concerns
    pub task_id: String,
}

/// Write the hook notification file the running board polls for. Used by
/// assistant hooks (`az notify stop <task-id>`), so it must stay dependency
/// free and fast.
pub async fn run(args: NotifyArgs) -> Result<()> {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64;
    let signal = SignalFile::new(&args.event, TaskId::new(&args.task_id), timestamp);
    let path = signal.write().context("writing notify file")?;
    tracing::debug!(path = %path.display(), "notify signal written");
    Ok(())
}
