// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::env::Clients;
use anyhow::{anyhow, Result};
use az_core::TaskId;
use az_engine::AttachCheck;
use clap::Args;
use std::path::PathBuf;

#[derive(Args)]
pub struct AttachArgs {
    /// Task whose session to attach to
    pub task_id: String,

    /// Attach even when the branch is behind base
    #[arg(long)]
    pub force: bool,
}

pub async fn run(project_root: PathBuf, args: AttachArgs) -> Result<()> {
    let clients = Clients::new(project_root)?;
    let task_id = TaskId::new(&args.task_id);
    let session = clients.session_for(&task_id);

    if !args.force {
        match clients.lifecycle.attach_check(&session).await? {
            AttachCheck::Ready { .. } => {}
            AttachCheck::BranchBehind { behind } => {
                return Err(anyhow!(
                    "branch {} is {} commit(s) behind {}; update from the board or re-run with --force",
                    session.branch,
                    behind,
                    clients.config.git.base_branch
                ));
            }
        }
    }

    exec_attach(&session.tmux_session)
}

/// Replace this process with `tmux attach-session`; the terminal belongs
/// to the multiplexer from here on.
#[cfg(unix)]
fn exec_attach(session: &str) -> Result<()> {
    use std::os::unix::process::CommandExt;

    let argv = az_adapters::attach_argv(session);
    let error = std::process::Command::new(&argv[0]).args(&argv[1..]).exec();
    Err(anyhow!("exec tmux failed: {}", error))
}

#[cfg(not(unix))]
fn exec_attach(session: &str) -> Result<()> {
    let argv = az_adapters::attach_argv(session);
    let status = std::process::Command::new(&argv[0]).args(&argv[1..]).status()?;
    if status.success() {
        Ok(())
    } else {
        Err(anyhow!("tmux attach exited with {}", status))
    }
}
