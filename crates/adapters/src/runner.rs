// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! External command execution.
//!
//! [`CommandRunner`] is the single injection seam for all subprocess calls.
//! The runner performs no shell interpolation: callers pass an argv list,
//! and anything destined for a shell is escaped before it gets here.

use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::io::AsyncWriteExt;

/// Default timeout for tmux commands.
pub const TMUX_TIMEOUT: Duration = Duration::from_secs(5);

/// Default timeout for local git operations.
pub const GIT_TIMEOUT: Duration = Duration::from_secs(5);

/// Timeout for git operations that touch the network (fetch, pull, push).
pub const GIT_NETWORK_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for issue-tool queries.
pub const BEADS_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for issue-tool sync (bidirectional, may push).
pub const BEADS_SYNC_TIMEOUT: Duration = Duration::from_secs(60);

/// Timeout for `gh` calls (network-bound).
pub const GH_TIMEOUT: Duration = Duration::from_secs(30);

/// A fully-specified external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CmdSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub timeout: Duration,
    /// Content piped to the child's stdin (clipboard helpers)
    pub stdin: Option<String>,
}

impl CmdSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            timeout: Duration::from_secs(10),
            stdin: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn stdin(mut self, content: impl Into<String>) -> Self {
        self.stdin = Some(content.into());
        self
    }

    /// One-line rendering for logs and error messages.
    pub fn display(&self) -> String {
        let mut line = self.program.clone();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

/// Captured result of a finished command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CmdOutput {
    pub stdout: String,
    pub stderr: String,
    /// Process exit code; -1 when terminated by a signal
    pub exit_code: i32,
}

impl CmdOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    #[cfg(any(test, feature = "test-support"))]
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
            exit_code: 0,
        }
    }

    #[cfg(any(test, feature = "test-support"))]
    pub fn err(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            stderr: stderr.into(),
            exit_code,
        }
    }
}

/// Errors from the runner itself (the process never produced an exit).
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("`{command}` timed out after {}s", timeout.as_secs())]
    Timeout { command: String, timeout: Duration },
    #[error("failed to launch `{command}`: {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },
    #[error("`{command}` was canceled")]
    Canceled { command: String },
}

impl RunnerError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, RunnerError::Timeout { .. })
    }
}

/// Executes external commands. The only seam between the engine and the
/// processes it drives; tests substitute [`crate::FakeRunner`].
#[async_trait]
pub trait CommandRunner: Clone + Send + Sync + 'static {
    async fn run(&self, spec: CmdSpec) -> Result<CmdOutput, RunnerError>;
}

/// Production runner backed by `tokio::process`.
///
/// The child is killed when the timeout elapses (kill-on-drop) and the
/// call fails with [`RunnerError::Timeout`].
#[derive(Clone, Copy, Default)]
pub struct SystemRunner;

impl SystemRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, spec: CmdSpec) -> Result<CmdOutput, RunnerError> {
        let command_line = spec.display();
        let mut cmd = tokio::process::Command::new(&spec.program);
        cmd.args(&spec.args)
            .stdin(if spec.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(ref dir) = spec.cwd {
            cmd.current_dir(dir);
        }

        let run = async {
            let mut child = cmd.spawn().map_err(|source| RunnerError::Spawn {
                command: command_line.clone(),
                source,
            })?;

            if let Some(content) = spec.stdin {
                if let Some(mut stdin) = child.stdin.take() {
                    let _ = stdin.write_all(content.as_bytes()).await;
                    // Drop closes the pipe so the child sees EOF
                }
            }

            let output = child
                .wait_with_output()
                .await
                .map_err(|source| RunnerError::Spawn {
                    command: command_line.clone(),
                    source,
                })?;

            Ok(CmdOutput {
                stdout: String::from_utf8_lossy(&output.stdout).to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
                exit_code: output.status.code().unwrap_or(-1),
            })
        };

        match tokio::time::timeout(spec.timeout, run).await {
            Ok(result) => {
                if let Ok(ref output) = result {
                    tracing::trace!(
                        command = %command_line,
                        exit_code = output.exit_code,
                        "command finished"
                    );
                }
                result
            }
            Err(_elapsed) => {
                tracing::warn!(command = %command_line, timeout_s = spec.timeout.as_secs(), "command timed out");
                Err(RunnerError::Timeout {
                    command: command_line,
                    timeout: spec.timeout,
                })
            }
        }
    }
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
