// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed wrapper over the `bd` issue CLI.
//!
//! The issue database is never touched directly: the CLI is the contract.
//! All list/show output is requested as `--json` and normalized into the
//! [`Task`] model, tolerating fields this client does not know about.

use crate::runner::{CmdOutput, CmdSpec, CommandRunner, BEADS_SYNC_TIMEOUT, BEADS_TIMEOUT};
use az_core::{IssueType, Priority, Task, TaskId, TaskStatus};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BeadsError {
    #[error("task not found: {0}")]
    NotFound(TaskId),
    #[error("issue tool rejected input: {0}")]
    InvalidInput(String),
    #[error("bd {op} failed: {stderr}")]
    Tool { op: &'static str, stderr: String },
    #[error("bd {op} timed out")]
    Timeout { op: &'static str },
    #[error("could not parse bd {op} output: {source}")]
    Parse {
        op: &'static str,
        source: serde_json::Error,
    },
}

/// Relation kinds accepted by `dep add`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepKind {
    Blocks,
    ParentChild,
    Related,
}

impl DepKind {
    fn wire_name(self) -> &'static str {
        match self {
            DepKind::Blocks => "blocks",
            DepKind::ParentChild => "parent-child",
            DepKind::Related => "related",
        }
    }
}

/// Edits applied by [`BeadsClient::update_details`]; unset fields are left
/// untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskEdit {
    pub title: Option<String>,
    pub description: Option<String>,
    pub design: Option<String>,
}

/// Request/response client for the issue tool. Emits no events.
#[derive(Clone)]
pub struct BeadsClient<R> {
    runner: R,
    /// Project root the CLI runs in (its database discovery is cwd-based)
    workdir: PathBuf,
}

impl<R: CommandRunner> BeadsClient<R> {
    pub fn new(runner: R, workdir: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            workdir: workdir.into(),
        }
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    async fn bd(&self, op: &'static str, args: &[&str]) -> Result<CmdOutput, BeadsError> {
        self.bd_in(op, args, &self.workdir, BEADS_TIMEOUT).await
    }

    async fn bd_in(
        &self,
        op: &'static str,
        args: &[&str],
        workdir: &Path,
        timeout: std::time::Duration,
    ) -> Result<CmdOutput, BeadsError> {
        let spec = CmdSpec::new("bd")
            .args(args.to_vec())
            .cwd(workdir)
            .timeout(timeout);
        let output = self.runner.run(spec).await.map_err(|e| {
            if e.is_timeout() {
                BeadsError::Timeout { op }
            } else {
                BeadsError::Tool {
                    op,
                    stderr: e.to_string(),
                }
            }
        })?;
        if !output.success() {
            return Err(classify_failure(op, &output.stderr));
        }
        Ok(output)
    }

    fn parse_tasks(op: &'static str, json: &str) -> Result<Vec<Task>, BeadsError> {
        if json.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(json).map_err(|source| BeadsError::Parse { op, source })
    }

    fn parse_task(op: &'static str, json: &str) -> Result<Task, BeadsError> {
        serde_json::from_str(json).map_err(|source| BeadsError::Parse { op, source })
    }

    /// All tasks in the project.
    pub async fn list_all(&self) -> Result<Vec<Task>, BeadsError> {
        let output = self.bd("list", &["list", "--json"]).await?;
        Self::parse_tasks("list", &output.stdout)
    }

    /// One task by id.
    pub async fn show(&self, id: &TaskId) -> Result<Task, BeadsError> {
        let output = self.bd("show", &["show", id.as_str(), "--json"]).await?;
        Self::parse_task("show", &output.stdout)
    }

    /// Tasks that are unblocked and ready to work.
    pub async fn ready(&self) -> Result<Vec<Task>, BeadsError> {
        let output = self.bd("ready", &["ready", "--json"]).await?;
        Self::parse_tasks("ready", &output.stdout)
    }

    /// Create a task; returns the tool's view of it (with assigned id).
    pub async fn create(
        &self,
        title: &str,
        issue_type: IssueType,
        priority: Priority,
        parent: Option<&TaskId>,
    ) -> Result<Task, BeadsError> {
        let priority_str = priority.level().to_string();
        let mut args = vec![
            "create",
            title,
            "--type",
            issue_type.wire_name(),
            "--priority",
            priority_str.as_str(),
            "--json",
        ];
        if let Some(parent) = parent {
            args.push("--parent");
            args.push(parent.as_str());
        }
        let output = self.bd("create", &args).await?;
        Self::parse_task("create", &output.stdout)
    }

    pub async fn update_status(&self, id: &TaskId, status: TaskStatus) -> Result<(), BeadsError> {
        self.bd(
            "update",
            &["update", id.as_str(), "--status", status.wire_name()],
        )
        .await?;
        Ok(())
    }

    pub async fn update_details(&self, id: &TaskId, edit: &TaskEdit) -> Result<(), BeadsError> {
        let mut args: Vec<&str> = vec!["update", id.as_str()];
        if let Some(ref title) = edit.title {
            args.push("--title");
            args.push(title);
        }
        if let Some(ref description) = edit.description {
            args.push("--description");
            args.push(description);
        }
        if let Some(ref design) = edit.design {
            args.push("--design");
            args.push(design);
        }
        if args.len() == 2 {
            return Ok(());
        }
        self.bd("update", &args).await?;
        Ok(())
    }

    pub async fn close(&self, id: &TaskId, reason: Option<&str>) -> Result<(), BeadsError> {
        let mut args = vec!["close", id.as_str()];
        if let Some(reason) = reason {
            args.push("--reason");
            args.push(reason);
        }
        self.bd("close", &args).await?;
        Ok(())
    }

    pub async fn delete(&self, id: &TaskId) -> Result<(), BeadsError> {
        self.bd("delete", &["delete", id.as_str(), "--force"]).await?;
        Ok(())
    }

    pub async fn archive(&self, id: &TaskId) -> Result<(), BeadsError> {
        self.bd("archive", &["archive", id.as_str()]).await?;
        Ok(())
    }

    /// Full-text search.
    pub async fn search(&self, text: &str) -> Result<Vec<Task>, BeadsError> {
        let output = self.bd("search", &["search", text, "--json"]).await?;
        Self::parse_tasks("search", &output.stdout)
    }

    /// Record a dependency between two tasks.
    pub async fn dep_add(
        &self,
        child: &TaskId,
        parent: &TaskId,
        kind: DepKind,
    ) -> Result<(), BeadsError> {
        self.bd(
            "dep-add",
            &[
                "dep",
                "add",
                child.as_str(),
                parent.as_str(),
                "--type",
                kind.wire_name(),
            ],
        )
        .await?;
        Ok(())
    }

    /// Bidirectional sync (push and pull) in the client's workdir.
    pub async fn sync(&self) -> Result<(), BeadsError> {
        self.bd_in("sync", &["sync"], &self.workdir, BEADS_SYNC_TIMEOUT)
            .await?;
        Ok(())
    }

    /// Sync in a specific worktree (for `az sync --all`).
    pub async fn sync_in(&self, workdir: &Path) -> Result<(), BeadsError> {
        self.bd_in("sync", &["sync"], workdir, BEADS_SYNC_TIMEOUT)
            .await?;
        Ok(())
    }

    /// An epic together with its children.
    pub async fn epic_with_children(&self, id: &TaskId) -> Result<(Task, Vec<Task>), BeadsError> {
        let epic = self.show(id).await?;
        let output = self
            .bd("list", &["list", "--parent", id.as_str(), "--json"])
            .await?;
        let children = Self::parse_tasks("list", &output.stdout)?;
        Ok((epic, children))
    }
}

/// Map a non-zero `bd` exit to a typed error by inspecting stderr.
fn classify_failure(op: &'static str, stderr: &str) -> BeadsError {
    let lower = stderr.to_lowercase();
    if lower.contains("not found") || lower.contains("no such") {
        // stderr typically reads "issue az-99 not found"
        let id = stderr
            .split_whitespace()
            .find(|w| w.contains('-'))
            .unwrap_or("unknown")
            .trim_matches(|c: char| !c.is_alphanumeric() && c != '-');
        return BeadsError::NotFound(TaskId::new(id));
    }
    if lower.contains("invalid") || lower.contains("usage:") || lower.contains("required") {
        return BeadsError::InvalidInput(stderr.trim().to_string());
    }
    BeadsError::Tool {
        op,
        stderr: stderr.trim().to_string(),
    }
}

#[cfg(test)]
#[path = "beads_tests.rs"]
mod tests;
