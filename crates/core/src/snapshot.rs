// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Immutable board snapshots published by the coordinator.
//!
//! Snapshots are versioned: the coordinator bumps `version` on every state
//! change, and each session carries a per-key `generation` that never
//! decreases, so consumers can drop stale deliveries safely.

use crate::event::{ServerKey, Toast};
use crate::server::DevServer;
use crate::session::Session;
use crate::task::{Task, TaskId};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A session as exposed to consumers, with its monotonic generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionView {
    pub session: Session,
    /// Bumped on every mutation of this session; never decreases
    pub generation: u64,
}

/// A dev server as exposed to consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerView {
    pub server: DevServer,
    pub generation: u64,
}

/// The complete published view of one project's board.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoardSnapshot {
    /// Global snapshot counter; strictly increasing per publication
    pub version: u64,
    /// Project root the snapshot describes
    pub project: Option<PathBuf>,
    /// Cached issue projection, in issue-tool order
    pub tasks: Vec<Task>,
    /// Active sessions, in activation order
    pub sessions: IndexMap<TaskId, SessionView>,
    /// Dev servers, in creation order
    pub servers: IndexMap<ServerKey, ServerView>,
    /// Notices raised since the previous snapshot
    pub toasts: Vec<Toast>,
}

impl BoardSnapshot {
    /// Session views sorted for board display (attention-first, then age).
    pub fn sessions_sorted(&self) -> Vec<&SessionView> {
        let mut views: Vec<&SessionView> = self.sessions.values().collect();
        views.sort_by_key(|v| (v.session.state.sort_rank(), v.session.started_at_ms));
        views
    }

    /// Look up a session's generation, 0 when absent.
    pub fn generation_of(&self, task_id: &TaskId) -> u64 {
        self.sessions.get(task_id).map(|v| v.generation).unwrap_or(0)
    }
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;
