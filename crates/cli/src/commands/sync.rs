// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::env::Clients;
use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

#[derive(Args)]
pub struct SyncArgs {
    /// Sync every worktree of the repository, not just the current one
    #[arg(long)]
    pub all: bool,
}

pub async fn run(project_root: PathBuf, args: SyncArgs) -> Result<()> {
    let clients = Clients::new(project_root)?;

    if !clients.config.beads.sync_enabled {
        println!("issue sync is disabled in the project config");
        return Ok(());
    }

    if !args.all {
        clients.beads.sync().await?;
        println!("synced {}", clients.project_root.display());
        return Ok(());
    }

    let worktrees = clients.git.list_worktrees(&clients.project_root).await?;
    let mut failed = 0usize;
    for worktree in &worktrees {
        match clients.beads.sync_in(worktree).await {
            Ok(()) => println!("synced {}", worktree.display()),
            Err(e) => {
                failed += 1;
                eprintln!("az: sync failed in {}: {}", worktree.display(), e);
            }
        }
    }
    if failed > 0 {
        anyhow::bail!("{} of {} worktrees failed to sync", failed, worktrees.len());
    }
    Ok(())
}
