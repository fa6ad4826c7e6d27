// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Commands accepted by the coordinator.
//!
//! Commands are acked with a structured [`CommandOutcome`]; side effects the
//! UI should surface (toasts, state transitions) arrive separately as
//! published events and snapshots.

use crate::task::TaskId;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

crate::define_id! {
    /// Correlation id attached to each command for ack routing and logs.
    pub struct CommandId;
}

impl CommandId {
    /// Mint a fresh random correlation id.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

/// How a session should be completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CompleteMode {
    /// Close the issue and tear down, no PR
    #[default]
    CloseOnly,
    /// Close the issue, open a PR via `gh`, then tear down
    WithPr,
}

/// Commands from the UI and CLI, applied in arrival order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Command {
    StartSession {
        task_id: TaskId,
        /// Prompt handed to the assistant on launch
        #[serde(default, skip_serializing_if = "Option::is_none")]
        initial_prompt: Option<String>,
    },
    Pause {
        task_id: TaskId,
    },
    Complete {
        task_id: TaskId,
        #[serde(default)]
        mode: CompleteMode,
    },
    Delete {
        task_id: TaskId,
    },
    UpdateFromBase {
        task_id: TaskId,
    },
    Attach {
        task_id: TaskId,
    },
    StartDevServer {
        task_id: TaskId,
        name: String,
    },
    StopDevServer {
        task_id: TaskId,
        name: String,
    },
    RestartDevServer {
        task_id: TaskId,
        name: String,
    },
    ToggleDevServer {
        task_id: TaskId,
        name: String,
    },
    RefreshIssues,
    SwitchProject {
        path: PathBuf,
    },
}

impl Command {
    /// Task this command targets, when it targets one.
    pub fn task_id(&self) -> Option<&TaskId> {
        match self {
            Command::StartSession { task_id, .. }
            | Command::Pause { task_id }
            | Command::Complete { task_id, .. }
            | Command::Delete { task_id }
            | Command::UpdateFromBase { task_id }
            | Command::Attach { task_id }
            | Command::StartDevServer { task_id, .. }
            | Command::StopDevServer { task_id, .. }
            | Command::RestartDevServer { task_id, .. }
            | Command::ToggleDevServer { task_id, .. } => Some(task_id),
            Command::RefreshIssues | Command::SwitchProject { .. } => None,
        }
    }
}

/// Structured ack for a processed command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CommandOutcome {
    /// Command completed (possibly with forked work still settling)
    Ok,
    /// Command accepted; a long-running workflow was forked
    Started,
    /// Attach refused: the branch is behind base by `behind` commits
    BranchBehind { behind: u64 },
    /// Update-from-base found nothing to merge
    AlreadyUpToDate,
    /// Update-from-base merged cleanly
    CleanMerge,
    /// Conflict-resolution assistant was launched for these paths
    ConflictsDetected { files: Vec<String> },
    /// Command failed; message is user-facing
    Failed { message: String },
}

#[cfg(test)]
#[path = "command_tests.rs"]
mod tests;
