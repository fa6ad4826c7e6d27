// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dev-server records.
//!
//! A task may own one dev server per logical name (`web`, `api`, ...).
//! Records persist across stop/start cycles with `status = Stopped` and are
//! only dropped on session teardown.

use crate::task::TaskId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Observed status of a dev server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DevServerStatus {
    #[default]
    Stopped,
    Starting,
    Running,
    Error,
    /// Monitor unhealthy; liveness cannot be determined
    Unknown,
}

impl DevServerStatus {
    pub fn is_running(self) -> bool {
        matches!(self, DevServerStatus::Starting | DevServerStatus::Running)
    }
}

impl fmt::Display for DevServerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DevServerStatus::Stopped => "stopped",
            DevServerStatus::Starting => "starting",
            DevServerStatus::Running => "running",
            DevServerStatus::Error => "error",
            DevServerStatus::Unknown => "unknown",
        })
    }
}

/// A long-running server process owned by a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DevServer {
    pub task_id: TaskId,
    /// Logical name from the config (`web`, `api`, ...)
    pub name: String,
    /// Command template as configured, before port interpolation
    pub command: String,
    /// Port allocated for this server, if any
    pub port: Option<u16>,
    pub status: DevServerStatus,
    /// tmux window hosting the server (`dev-{name}`)
    pub window: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    /// Milliseconds since the Unix epoch when the server was last started
    pub started_at_ms: u64,
}

impl DevServer {
    /// The tmux window name for a server of the given logical name.
    pub fn window_name(name: &str) -> String {
        format!("dev-{}", name)
    }

    /// Parse a logical server name back out of a `dev-*` window name.
    pub fn name_from_window(window: &str) -> Option<&str> {
        window.strip_prefix("dev-").filter(|n| !n.is_empty())
    }
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
