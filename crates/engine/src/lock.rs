// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Single-instance workspace lock.
//!
//! One board process per project: a second instance fails fast instead of
//! fighting over tmux sessions and ports.

use crate::error::OrchestratorError;
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Lock file name inside the project root.
pub const LOCK_FILE: &str = ".azedarach.lock";

/// Exclusive advisory lock on a project, released on drop.
pub struct WorkspaceLock {
    // NOTE(lifetime): held to keep the exclusive flock; released on drop
    #[allow(dead_code)]
    file: File,
    path: PathBuf,
}

impl WorkspaceLock {
    pub fn acquire(project_root: &Path) -> Result<Self, OrchestratorError> {
        let path = project_root.join(LOCK_FILE);
        let mut file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(|e| OrchestratorError::Tool {
                op: format!("open lock {}", path.display()),
                stderr: e.to_string(),
            })?;

        file.try_lock_exclusive().map_err(|_| {
            OrchestratorError::Conflict(format!(
                "another azedarach instance holds {}",
                path.display()
            ))
        })?;

        // Best-effort pid note for humans inspecting the file
        let _ = writeln!(file, "{}", std::process::id());
        tracing::debug!(path = %path.display(), "workspace lock acquired");
        Ok(Self { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
#[path = "lock_tests.rs"]
mod tests;
