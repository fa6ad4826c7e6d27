// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI environment: project resolution, config loading, tracing setup,
//! and construction of the production client stack.

use anyhow::{anyhow, Context, Result};
use az_adapters::{
    BeadsClient, Clipboard, GhClient, GitClient, SystemRunner, TmuxClient,
};
use az_core::{Config, Session, SessionState, SystemClock, TaskId, BEADS_DIR};
use az_engine::SessionLifecycle;
use std::path::{Path, PathBuf};

/// Locate the project root: an explicit `-C` directory, or the nearest
/// ancestor of the current directory containing the issue data directory.
pub fn resolve_project_root(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(dir) = explicit {
        return Some(dir.to_path_buf());
    }
    let mut dir = std::env::current_dir().ok()?;
    loop {
        if dir.join(BEADS_DIR).is_dir() {
            return Some(dir);
        }
        if !dir.pop() {
            return None;
        }
    }
}

pub fn require_project(project_root: Option<PathBuf>) -> Result<PathBuf> {
    project_root.ok_or_else(|| {
        anyhow!("not inside a project (no {} directory found); use -C <dir>", BEADS_DIR)
    })
}

/// Set up tracing. Board mode logs to a file in the project (the terminal
/// belongs to the UI); one-shot commands log to stderr. Returns the guard
/// keeping the non-blocking writer alive.
pub fn init_tracing(
    board_mode: bool,
    project_root: Option<&Path>,
) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_env("AZ_LOG").unwrap_or_else(|_| EnvFilter::new("info"));

    if board_mode {
        if let Some(root) = project_root {
            let appender = tracing_appender::rolling::never(root, ".azedarach.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .init();
            return Some(guard);
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    None
}

/// The production client stack for one-shot commands.
pub struct Clients {
    pub config: Config,
    pub project_root: PathBuf,
    pub tmux: TmuxClient<SystemRunner>,
    pub git: GitClient<SystemRunner>,
    pub beads: BeadsClient<SystemRunner>,
    pub lifecycle: SessionLifecycle<SystemRunner, SystemClock>,
}

impl Clients {
    pub fn new(project_root: PathBuf) -> Result<Self> {
        let config = Config::load(&project_root).context("loading .azedarach.json")?;
        let runner = SystemRunner::new();
        let tmux = TmuxClient::new(runner);
        let git = GitClient::new(runner);
        let beads = BeadsClient::new(runner, &project_root);
        let lifecycle = SessionLifecycle::new(
            tmux.clone(),
            git.clone(),
            beads.clone(),
            GhClient::new(runner, &project_root),
            Clipboard::new(runner),
            config.clone(),
            project_root.clone(),
            SystemClock,
        );
        Ok(Self {
            config,
            project_root,
            tmux,
            git,
            beads,
            lifecycle,
        })
    }

    /// Reconstruct the session record for a task from config-derived names.
    pub fn session_for(&self, task_id: &TaskId) -> Session {
        let branch = self.config.branch_name(task_id.as_str());
        Session {
            task_id: task_id.clone(),
            worktree: self
                .config
                .worktree_path(&self.project_root, task_id.as_str()),
            tmux_session: branch.clone(),
            branch,
            state: SessionState::Unknown,
            started_at_ms: 0,
            last_output: None,
            last_error: None,
        }
    }
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
