// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Thin wrapper over the `gh` CLI for pull-request creation.

use crate::runner::{CmdSpec, CommandRunner, GH_TIMEOUT};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GhError {
    #[error("gh {op} failed: {stderr}")]
    Tool { op: &'static str, stderr: String },
    #[error("gh {op} timed out")]
    Timeout { op: &'static str },
}

/// Parameters for `gh pr create`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrRequest {
    pub title: String,
    pub body: String,
    pub base: String,
    pub draft: bool,
}

/// Pull-request client. Only the operations the lifecycle needs.
#[derive(Clone)]
pub struct GhClient<R> {
    runner: R,
    workdir: PathBuf,
}

impl<R: CommandRunner> GhClient<R> {
    pub fn new(runner: R, workdir: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            workdir: workdir.into(),
        }
    }

    /// Create a PR for the current branch; returns the PR URL.
    pub async fn create_pr(&self, request: &PrRequest) -> Result<String, GhError> {
        let mut args = vec![
            "pr",
            "create",
            "--title",
            &request.title,
            "--body",
            &request.body,
            "--base",
            &request.base,
        ];
        if request.draft {
            args.push("--draft");
        }
        let spec = CmdSpec::new("gh")
            .args(args)
            .cwd(&self.workdir)
            .timeout(GH_TIMEOUT);
        let output = self.runner.run(spec).await.map_err(|e| {
            if e.is_timeout() {
                GhError::Timeout { op: "pr-create" }
            } else {
                GhError::Tool {
                    op: "pr-create",
                    stderr: e.to_string(),
                }
            }
        })?;
        if !output.success() {
            return Err(GhError::Tool {
                op: "pr-create",
                stderr: output.stderr.trim().to_string(),
            });
        }
        Ok(output.stdout.trim().to_string())
    }

    /// Enable auto-merge on a PR (used when `pr.autoMerge` is set).
    pub async fn enable_auto_merge(&self, pr_url: &str) -> Result<(), GhError> {
        let spec = CmdSpec::new("gh")
            .args(["pr", "merge", pr_url, "--auto", "--squash"])
            .cwd(&self.workdir)
            .timeout(GH_TIMEOUT);
        let output = self.runner.run(spec).await.map_err(|e| {
            if e.is_timeout() {
                GhError::Timeout { op: "pr-merge" }
            } else {
                GhError::Tool {
                    op: "pr-merge",
                    stderr: e.to_string(),
                }
            }
        })?;
        if !output.success() {
            return Err(GhError::Tool {
                op: "pr-merge",
                stderr: output.stderr.trim().to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "gh_tests.rs"]
mod tests;
