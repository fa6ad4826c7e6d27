// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::env::Clients;
use crate::output;
use anyhow::Result;
use az_engine::Detector;
use clap::Args;
use std::path::PathBuf;

#[derive(Args)]
pub struct StatusArgs {
    /// Also print the last captured output line per session
    #[arg(long, short = 'v')]
    pub verbose: bool,
}

pub async fn run(project_root: PathBuf, args: StatusArgs) -> Result<()> {
    let clients = Clients::new(project_root)?;
    let detector = Detector::default();
    let prefix = &clients.config.git.branch_prefix;

    let tasks = clients.beads.list_all().await.unwrap_or_default();
    let sessions = clients.tmux.list_sessions().await?;
    let mut rows = Vec::new();

    for session in sessions {
        // Sessions are named after task branches
        let Some(task_id) = session.strip_prefix(prefix.as_str()) else {
            continue;
        };
        let (state, snippet) = match clients.tmux.capture_pane(&session, 80).await {
            Ok(output) => (
                detector.classify(&output),
                detector.snippet(&output, 1).unwrap_or_default(),
            ),
            Err(_) => (az_core::SessionState::Unknown, String::new()),
        };
        let title = tasks
            .iter()
            .find(|t| t.id == *task_id)
            .map(|t| t.title.clone())
            .unwrap_or_default();
        rows.push(output::StatusRow {
            task_id: task_id.to_string(),
            state,
            title,
            session,
            snippet,
        });
    }

    if rows.is_empty() {
        println!("no active sessions");
        return Ok(());
    }
    print!("{}", output::render_status(&rows, args.verbose));
    Ok(())
}
