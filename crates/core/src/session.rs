// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session records and observed session state.
//!
//! A Session binds a task to its git worktree, tmux session, and branch.
//! The tmux session name always equals the branch name, which is derived
//! from the task id; this is what makes names collision-free.

use crate::task::TaskId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Observed state of an active session, classified from pane output.
///
/// Any state may follow any other: transitions are driven entirely by what
/// the detector sees, plus the `Paused`/`Unknown` states set by the
/// coordinator and supervisor respectively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// No assistant activity observed
    #[default]
    Idle,
    /// Assistant is producing output
    Busy,
    /// Assistant is blocked on user input
    Waiting,
    /// Explicit completion marker observed
    Done,
    /// Error pattern observed
    Error,
    /// Interrupted by the user
    Paused,
    /// Monitor unhealthy; state cannot be trusted
    Unknown,
}

impl SessionState {
    /// Board sort rank: lower sorts first.
    ///
    /// Waiting > Busy > Error > Paused > Done > Idle > Unknown, so sessions
    /// needing attention float to the top.
    pub fn sort_rank(self) -> u8 {
        match self {
            SessionState::Waiting => 0,
            SessionState::Busy => 1,
            SessionState::Error => 2,
            SessionState::Paused => 3,
            SessionState::Done => 4,
            SessionState::Idle => 5,
            SessionState::Unknown => 6,
        }
    }

    /// Single-character glyph for compact board rendering.
    pub fn glyph(self) -> &'static str {
        match self {
            SessionState::Idle => "·",
            SessionState::Busy => "▶",
            SessionState::Waiting => "?",
            SessionState::Done => "✓",
            SessionState::Error => "✗",
            SessionState::Paused => "⏸",
            SessionState::Unknown => "~",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SessionState::Idle => "idle",
            SessionState::Busy => "busy",
            SessionState::Waiting => "waiting",
            SessionState::Done => "done",
            SessionState::Error => "error",
            SessionState::Paused => "paused",
            SessionState::Unknown => "unknown",
        })
    }
}

/// Orchestration record for an activated task.
///
/// Created by the lifecycle manager, mutated only inside the coordinator,
/// destroyed on completion or explicit deletion. At most one Session exists
/// per task id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub task_id: TaskId,
    /// Absolute path of the dedicated worktree
    pub worktree: PathBuf,
    /// Branch the worktree is checked out on
    pub branch: String,
    /// tmux session name (equal to the branch name)
    pub tmux_session: String,
    pub state: SessionState,
    /// Milliseconds since the Unix epoch when the session was started
    pub started_at_ms: u64,
    /// Most recent captured pane tail, for board preview
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_output: Option<String>,
    /// Last user-facing failure for this session, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl Session {
    /// Age of the session in whole seconds at `now_ms`.
    pub fn age_secs(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.started_at_ms) / 1000
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
