// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::env::Clients;
use anyhow::Result;
use az_core::TaskId;
use clap::Args;
use std::path::PathBuf;

#[derive(Args)]
pub struct PauseArgs {
    /// Task whose assistant to interrupt
    pub task_id: String,
}

pub async fn run(project_root: PathBuf, args: PauseArgs) -> Result<()> {
    let clients = Clients::new(project_root)?;
    let session = clients.session_for(&TaskId::new(&args.task_id));
    clients.lifecycle.pause(&session).await?;
    println!("interrupted {}", session.tmux_session);
    Ok(())
}
