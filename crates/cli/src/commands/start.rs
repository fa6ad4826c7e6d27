// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::env::Clients;
use anyhow::Result;
use az_core::TaskId;
use clap::Args;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

#[derive(Args)]
pub struct StartArgs {
    /// Task to activate
    pub task_id: String,

    /// Initial prompt handed to the assistant
    #[arg(long, short = 'p')]
    pub prompt: Option<String>,
}

pub async fn run(project_root: PathBuf, args: StartArgs) -> Result<()> {
    let clients = Clients::new(project_root)?;
    let task_id = TaskId::new(&args.task_id);
    let cancel = CancellationToken::new();

    let cancel_on_ctrlc = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel_on_ctrlc.cancel();
        }
    });

    let session = clients
        .lifecycle
        .create_and_start(&task_id, args.prompt.as_deref(), &cancel)
        .await?;

    println!(
        "started {} on branch {} (worktree {})",
        session.task_id,
        session.branch,
        session.worktree.display()
    );
    println!("attach with: az attach {}", session.task_id);
    Ok(())
}
