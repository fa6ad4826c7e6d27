// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed tmux client.
//!
//! Session and window names are the caller's responsibility; this client
//! never mangles them. Transient timeouts are retried twice with linear
//! backoff before surfacing.

use crate::runner::{CmdOutput, CmdSpec, CommandRunner, RunnerError, TMUX_TIMEOUT};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Retries after a timed-out tmux call.
const TIMEOUT_RETRIES: u32 = 2;

#[derive(Debug, Error)]
pub enum TmuxError {
    #[error("tmux target not found: {0}")]
    NotFound(String),
    #[error("tmux {op} failed for {target}: {message}")]
    Command {
        op: &'static str,
        target: String,
        message: String,
    },
    #[error("tmux {op} timed out for {target}")]
    Timeout { op: &'static str, target: String },
}

/// Client for the terminal multiplexer.
#[derive(Clone)]
pub struct TmuxClient<R> {
    runner: R,
}

impl<R: CommandRunner> TmuxClient<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    /// Run one tmux command, retrying timeouts with linear backoff.
    async fn tmux(
        &self,
        op: &'static str,
        target: &str,
        args: &[&str],
    ) -> Result<CmdOutput, TmuxError> {
        let mut attempt = 0;
        loop {
            let spec = CmdSpec::new("tmux").args(args.to_vec()).timeout(TMUX_TIMEOUT);
            match self.runner.run(spec).await {
                Ok(output) => return Ok(output),
                Err(RunnerError::Timeout { .. }) if attempt < TIMEOUT_RETRIES => {
                    attempt += 1;
                    tracing::debug!(op, target, attempt, "tmux timeout, retrying");
                    tokio::time::sleep(Duration::from_millis(100 * u64::from(attempt))).await;
                }
                Err(RunnerError::Timeout { .. }) => {
                    return Err(TmuxError::Timeout {
                        op,
                        target: target.to_string(),
                    })
                }
                Err(e) => {
                    return Err(TmuxError::Command {
                        op,
                        target: target.to_string(),
                        message: e.to_string(),
                    })
                }
            }
        }
    }

    /// Create a detached session with the given working directory.
    pub async fn new_session(&self, name: &str, cwd: &Path) -> Result<(), TmuxError> {
        let cwd_str = cwd.display().to_string();
        let output = self
            .tmux(
                "new-session",
                name,
                &["new-session", "-d", "-s", name, "-c", &cwd_str],
            )
            .await?;
        if !output.success() {
            return Err(TmuxError::Command {
                op: "new-session",
                target: name.to_string(),
                message: output.stderr.trim().to_string(),
            });
        }
        Ok(())
    }

    pub async fn has_session(&self, name: &str) -> Result<bool, TmuxError> {
        let output = self
            .tmux("has-session", name, &["has-session", "-t", name])
            .await?;
        Ok(output.success())
    }

    /// Kill a session. Succeeds if the session is already gone.
    pub async fn kill_session(&self, name: &str) -> Result<(), TmuxError> {
        let output = self
            .tmux("kill-session", name, &["kill-session", "-t", name])
            .await?;
        if output.success() || is_gone(&output.stderr) {
            Ok(())
        } else {
            Err(TmuxError::Command {
                op: "kill-session",
                target: name.to_string(),
                message: output.stderr.trim().to_string(),
            })
        }
    }

    /// Send literal text to a pane, optionally followed by Enter.
    ///
    /// `-l` disables key-name interpretation and `--` guards against text
    /// beginning with a dash. Callers escape shell-bound content first.
    pub async fn send_keys(&self, target: &str, text: &str, enter: bool) -> Result<(), TmuxError> {
        let output = self
            .tmux(
                "send-keys",
                target,
                &["send-keys", "-t", target, "-l", "--", text],
            )
            .await?;
        if !output.success() {
            return Err(TmuxError::NotFound(target.to_string()));
        }
        if enter {
            self.send_key(target, "Enter").await?;
        }
        Ok(())
    }

    /// Send a named key (e.g. `Enter`, `C-c`) to a pane.
    pub async fn send_key(&self, target: &str, key: &str) -> Result<(), TmuxError> {
        let output = self
            .tmux("send-keys", target, &["send-keys", "-t", target, key])
            .await?;
        if !output.success() {
            return Err(TmuxError::NotFound(target.to_string()));
        }
        Ok(())
    }

    /// Send an interrupt (control-c) to a pane.
    pub async fn send_interrupt(&self, target: &str) -> Result<(), TmuxError> {
        self.send_key(target, "C-c").await
    }

    /// Capture the last `lines` lines of a pane's visible output.
    pub async fn capture_pane(&self, target: &str, lines: u32) -> Result<String, TmuxError> {
        let start = format!("-{}", lines);
        let output = self
            .tmux(
                "capture-pane",
                target,
                &["capture-pane", "-t", target, "-p", "-S", &start],
            )
            .await?;
        if !output.success() {
            return Err(TmuxError::NotFound(target.to_string()));
        }
        Ok(output.stdout)
    }

    /// Names of all live sessions. An unreachable tmux server means none.
    pub async fn list_sessions(&self) -> Result<Vec<String>, TmuxError> {
        let output = self
            .tmux(
                "list-sessions",
                "*",
                &["list-sessions", "-F", "#{session_name}"],
            )
            .await?;
        if !output.success() {
            if is_gone(&output.stderr) {
                return Ok(Vec::new());
            }
            return Err(TmuxError::Command {
                op: "list-sessions",
                target: "*".to_string(),
                message: output.stderr.trim().to_string(),
            });
        }
        Ok(lines_of(&output.stdout))
    }

    /// Window names within a session.
    pub async fn list_windows(&self, session: &str) -> Result<Vec<String>, TmuxError> {
        let output = self
            .tmux(
                "list-windows",
                session,
                &["list-windows", "-t", session, "-F", "#{window_name}"],
            )
            .await?;
        if !output.success() {
            return Err(TmuxError::NotFound(session.to_string()));
        }
        Ok(lines_of(&output.stdout))
    }

    /// Create a named window, optionally running a command in it.
    pub async fn new_window(
        &self,
        session: &str,
        name: &str,
        command: Option<&str>,
    ) -> Result<(), TmuxError> {
        let mut args = vec!["new-window", "-d", "-t", session, "-n", name];
        if let Some(cmd) = command {
            args.push(cmd);
        }
        let output = self.tmux("new-window", session, &args).await?;
        if !output.success() {
            return Err(TmuxError::Command {
                op: "new-window",
                target: format!("{}:{}", session, name),
                message: output.stderr.trim().to_string(),
            });
        }
        Ok(())
    }

    /// Kill a window. Succeeds if the window is already gone.
    pub async fn kill_window(&self, session: &str, window: &str) -> Result<(), TmuxError> {
        let target = format!("{}:{}", session, window);
        let output = self
            .tmux("kill-window", session, &["kill-window", "-t", &target])
            .await?;
        if output.success() || is_gone(&output.stderr) {
            Ok(())
        } else {
            Err(TmuxError::Command {
                op: "kill-window",
                target,
                message: output.stderr.trim().to_string(),
            })
        }
    }

    /// Set a session-scoped environment variable.
    pub async fn set_environment(
        &self,
        session: &str,
        key: &str,
        value: &str,
    ) -> Result<(), TmuxError> {
        let output = self
            .tmux(
                "set-environment",
                session,
                &["set-environment", "-t", session, key, value],
            )
            .await?;
        if !output.success() {
            return Err(TmuxError::Command {
                op: "set-environment",
                target: session.to_string(),
                message: output.stderr.trim().to_string(),
            });
        }
        Ok(())
    }

    /// Read back a session-scoped environment variable, if set.
    pub async fn show_environment(
        &self,
        session: &str,
        key: &str,
    ) -> Result<Option<String>, TmuxError> {
        let output = self
            .tmux(
                "show-environment",
                session,
                &["show-environment", "-t", session, key],
            )
            .await?;
        if !output.success() {
            // tmux exits non-zero for unknown variables
            return Ok(None);
        }
        Ok(output
            .stdout
            .lines()
            .next()
            .and_then(|line| line.split_once('='))
            .map(|(_, value)| value.to_string()))
    }
}

/// Argv for a blocking `tmux attach-session`, surfaced only to the CLI
/// attach path which execs it directly.
pub fn attach_argv(session: &str) -> Vec<String> {
    vec![
        "tmux".to_string(),
        "attach-session".to_string(),
        "-t".to_string(),
        session.to_string(),
    ]
}

fn lines_of(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect()
}

/// Whether stderr indicates the target (or the whole server) is gone.
fn is_gone(stderr: &str) -> bool {
    let s = stderr.to_lowercase();
    s.contains("can't find") || s.contains("no server running") || s.contains("server not found")
}

#[cfg(test)]
#[path = "tmux_tests.rs"]
mod tests;
