// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Events published by the orchestration core.
//!
//! Monitors and workers never mutate coordinator state directly; they emit
//! these events, and the coordinator folds them into its state before
//! publishing a new snapshot.
//!
//! Serializes with `{"type": "scope:name", ...fields}` tags so the notify
//! signal files and any future IPC stay self-describing.

use crate::server::DevServerStatus;
use crate::session::SessionState;
use crate::task::{Task, TaskId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Composite key identifying one dev server: `(task, logical name)`.
///
/// Serializes as the `task/name` string so it can key JSON maps in
/// snapshots and signal payloads. Task ids never contain `/`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServerKey {
    pub task_id: TaskId,
    pub name: String,
}

impl ServerKey {
    pub fn new(task_id: impl Into<TaskId>, name: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ServerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.task_id, self.name)
    }
}

impl Serialize for ServerKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ServerKey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        let (task_id, name) = raw
            .split_once('/')
            .ok_or_else(|| serde::de::Error::custom(format!("invalid server key: {}", raw)))?;
        if name.is_empty() {
            return Err(serde::de::Error::custom(format!(
                "server key has no name: {}",
                raw
            )));
        }
        Ok(ServerKey::new(task_id, name))
    }
}

/// Severity of a user-facing toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToastSeverity {
    /// Short-lived informational notice
    Info,
    /// Short-lived warning (e.g. compensation failure summary)
    Warning,
    /// Long-lived error notice
    Error,
}

/// A user-facing notice published alongside snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toast {
    pub severity: ToastSeverity,
    pub message: String,
}

impl Toast {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            severity: ToastSeverity::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: ToastSeverity::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: ToastSeverity::Error,
            message: message.into(),
        }
    }
}

/// Events flowing into and out of the coordinator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    // -- session monitoring --
    #[serde(rename = "session:state")]
    SessionStateChanged {
        task_id: TaskId,
        state: SessionState,
        /// Trimmed tail of the captured pane, for board preview
        #[serde(default, skip_serializing_if = "Option::is_none")]
        output_snippet: Option<String>,
    },

    /// Monitor crash budget exhausted or captures failing
    #[serde(rename = "session:unknown")]
    SessionMarkedUnknown { task_id: TaskId, reason: String },

    // -- dev server monitoring --
    #[serde(rename = "server:status")]
    ServerStatusChanged {
        key: ServerKey,
        status: DevServerStatus,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },

    #[serde(rename = "server:unknown")]
    ServerMarkedUnknown { key: ServerKey, reason: String },

    // -- issue cache --
    #[serde(rename = "tasks:refreshed")]
    TasksRefreshed { tasks: Vec<Task> },

    // -- hook notifications (written by `az notify`, picked up by monitors) --
    #[serde(rename = "hook:signal")]
    HookSignal {
        task_id: TaskId,
        /// Event name as given to `az notify` (e.g. `stop`, `permission`)
        event: String,
    },

    // -- user-facing notices --
    #[serde(rename = "toast")]
    ToastRaised { toast: Toast },
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
