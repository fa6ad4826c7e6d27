// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Hook notification files.
//!
//! `az notify <event> <task-id>` writes a small JSON file that the running
//! board picks up through the session monitor's poll loop. Files are
//! written atomically (temp file + rename) so a half-written file is never
//! observed, and consumed files are unlinked.

use crate::task::TaskId;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A hook notification as written to `/tmp/azedarach-notify-<task-id>.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalFile {
    pub event: String,
    pub task_id: TaskId,
    /// Milliseconds since the Unix epoch at write time
    pub timestamp: u64,
}

impl SignalFile {
    pub fn new(event: impl Into<String>, task_id: impl Into<TaskId>, timestamp: u64) -> Self {
        Self {
            event: event.into(),
            task_id: task_id.into(),
            timestamp,
        }
    }

    /// Well-known path for a task's signal file.
    pub fn path_for(task_id: &TaskId) -> PathBuf {
        std::env::temp_dir().join(format!("azedarach-notify-{}.json", task_id))
    }

    /// Atomically write the signal file for this task.
    pub fn write(&self) -> std::io::Result<PathBuf> {
        let path = Self::path_for(&self.task_id);
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_string(self).map_err(std::io::Error::other)?;
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &path)?;
        Ok(path)
    }

    /// Read and remove a pending signal file, if one exists.
    ///
    /// Returns `None` when the file is absent or unreadable; a malformed
    /// file is removed so it cannot wedge the monitor loop.
    pub fn take(task_id: &TaskId) -> Option<Self> {
        let path = Self::path_for(task_id);
        let content = std::fs::read_to_string(&path).ok()?;
        let _ = std::fs::remove_file(&path);
        serde_json::from_str(&content).ok()
    }
}

#[cfg(test)]
#[path = "signal_tests.rs"]
mod tests;
