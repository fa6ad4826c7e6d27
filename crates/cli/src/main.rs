// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! az - Azedarach CLI

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod commands;
mod env;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{attach, board, dev, notify, pause, project, start, status, sync};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "az",
    version,
    about = "Azedarach - a developer orchestration workstation"
)]
struct Cli {
    /// Project directory (defaults to the current directory)
    #[arg(short = 'C', global = true, value_name = "DIR")]
    directory: Option<PathBuf>,

    /// Project directory for board mode (`az [project-dir]`)
    #[arg(value_name = "PROJECT_DIR")]
    project_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Activate a task: worktree, branch, session, assistant
    Start(start::StartArgs),
    /// Attach to an existing session (checks for a stale branch first)
    Attach(attach::AttachArgs),
    /// Interrupt a session's assistant
    Pause(pause::PauseArgs),
    /// Show active sessions and their states
    Status(status::StatusArgs),
    /// Run the issue tool's sync in the current worktree or all of them
    Sync(sync::SyncArgs),
    /// Write a hook notification for the running board
    Notify(notify::NotifyArgs),
    /// Project registry management
    Project(project::ProjectArgs),
    /// Dev server controls
    Dev(dev::DevArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let board_mode = cli.command.is_none();
    let explicit = cli.project_dir.as_deref().or(cli.directory.as_deref());
    let project_root = env::resolve_project_root(explicit);

    let _log_guard = env::init_tracing(board_mode, project_root.as_deref());

    let result = run(cli, project_root).await;
    if let Err(e) = result {
        eprintln!("az: {}", single_line(&e));
        std::process::exit(1);
    }
}

async fn run(cli: Cli, project_root: Option<PathBuf>) -> Result<()> {
    match cli.command {
        None => board::run(env::require_project(project_root)?).await,
        Some(Commands::Start(args)) => start::run(env::require_project(project_root)?, args).await,
        Some(Commands::Attach(args)) => {
            attach::run(env::require_project(project_root)?, args).await
        }
        Some(Commands::Pause(args)) => pause::run(env::require_project(project_root)?, args).await,
        Some(Commands::Status(args)) => {
            status::run(env::require_project(project_root)?, args).await
        }
        Some(Commands::Sync(args)) => sync::run(env::require_project(project_root)?, args).await,
        Some(Commands::Notify(args)) => notify::run(args).await,
        Some(Commands::Project(args)) => project::run(args).await,
        Some(Commands::Dev(args)) => dev::run(env::require_project(project_root)?, args).await,
    }
}

/// Flatten an error chain to one stderr line.
fn single_line(error: &anyhow::Error) -> String {
    let mut line = error.to_string();
    for cause in error.chain().skip(1) {
        line.push_str(": ");
        line.push_str(&cause.to_string());
    }
    line.replace('\n', " ")
}
