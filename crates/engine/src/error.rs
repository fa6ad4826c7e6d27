// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Orchestrator error model.
//!
//! Adapter errors are folded into these kinds at the engine boundary; the
//! coordinator converts anything that escapes a workflow into a toast and
//! an event, never a panic.

use az_adapters::{BeadsError, GhError, GitError, TmuxError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Referenced task/session/worktree does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Precondition violated (session exists, port taken, range exhausted)
    #[error("conflict: {0}")]
    Conflict(String),

    /// External process exceeded its deadline
    #[error("timed out: {0}")]
    Timeout(String),

    /// External CLI failed; carries the operation label and stderr
    #[error("{op}: {stderr}")]
    Tool { op: String, stderr: String },

    /// External output could not be interpreted
    #[error("parse error: {0}")]
    Parse(String),

    /// Network probe says we're offline; fetch/push paths only
    #[error("offline: {0}")]
    Offline(String),

    /// Canceled by the user or a parent workflow
    #[error("canceled")]
    Canceled,

    /// Merge would conflict; carries the filtered conflict paths
    #[error("merge conflicts in {} file(s)", files.len())]
    MergeConflict { files: Vec<String> },

    /// Cleanup after another failure itself failed; both are reported
    #[error("{primary}; cleanup also failed: {}", compensation.join("; "))]
    Compensation {
        primary: Box<OrchestratorError>,
        compensation: Vec<String>,
    },
}

impl OrchestratorError {
    /// Wrap an error with the compensation failures collected while
    /// rolling back, if any.
    pub fn with_compensation(self, failures: Vec<String>) -> Self {
        if failures.is_empty() {
            self
        } else {
            OrchestratorError::Compensation {
                primary: Box::new(self),
                compensation: failures,
            }
        }
    }
}

impl From<TmuxError> for OrchestratorError {
    fn from(e: TmuxError) -> Self {
        match e {
            TmuxError::NotFound(target) => {
                OrchestratorError::NotFound(format!("tmux target {}", target))
            }
            TmuxError::Timeout { op, target } => {
                OrchestratorError::Timeout(format!("tmux {} for {}", op, target))
            }
            TmuxError::Command {
                op,
                target,
                message,
            } => OrchestratorError::Tool {
                op: format!("tmux {} ({})", op, target),
                stderr: message,
            },
        }
    }
}

impl From<GitError> for OrchestratorError {
    fn from(e: GitError) -> Self {
        match e {
            GitError::Timeout { op, worktree } => {
                OrchestratorError::Timeout(format!("git {} in {}", op, worktree))
            }
            GitError::Parse { op, message } => {
                OrchestratorError::Parse(format!("git {}: {}", op, message))
            }
            GitError::Command {
                op,
                worktree,
                message,
            } => {
                if looks_offline(&message) {
                    OrchestratorError::Offline(format!("git {}: {}", op, message))
                } else {
                    OrchestratorError::Tool {
                        op: format!("git {} ({})", op, worktree),
                        stderr: message,
                    }
                }
            }
        }
    }
}

/// Whether a git stderr message indicates missing connectivity rather
/// than a repository problem.
fn looks_offline(stderr: &str) -> bool {
    let lower = stderr.to_lowercase();
    ["could not resolve host", "unable to access", "network is unreachable", "connection timed out"]
        .iter()
        .any(|marker| lower.contains(marker))
}

impl From<BeadsError> for OrchestratorError {
    fn from(e: BeadsError) -> Self {
        match e {
            BeadsError::NotFound(id) => OrchestratorError::NotFound(format!("task {}", id)),
            BeadsError::Timeout { op } => OrchestratorError::Timeout(format!("bd {}", op)),
            BeadsError::Parse { op, source } => {
                OrchestratorError::Parse(format!("bd {}: {}", op, source))
            }
            BeadsError::InvalidInput(message) => OrchestratorError::Tool {
                op: "bd".to_string(),
                stderr: message,
            },
            BeadsError::Tool { op, stderr } => OrchestratorError::Tool {
                op: format!("bd {}", op),
                stderr,
            },
        }
    }
}

impl From<GhError> for OrchestratorError {
    fn from(e: GhError) -> Self {
        match e {
            GhError::Timeout { op } => OrchestratorError::Timeout(format!("gh {}", op)),
            GhError::Tool { op, stderr } => OrchestratorError::Tool {
                op: format!("gh {}", op),
                stderr,
            },
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
