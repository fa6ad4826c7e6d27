// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session lifecycle workflows.
//!
//! `create_and_start` is an atomic workflow: every provisioned resource is
//! compensated in reverse order if a later step fails, so a failed start
//! leaves no worktree, branch, or tmux session behind. Teardown attempts
//! every step regardless of earlier failures and aggregates what broke.

use crate::error::OrchestratorError;
use az_adapters::{
    BeadsClient, Clipboard, CommandRunner, GhClient, GitClient, PrRequest, TmuxClient,
};
use az_core::{
    escape_double_quoted, quote_double, Clock, CompleteMode, Config, GitWorkflowMode, Session,
    SessionState, Task, TaskId,
};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Environment marker set in the tmux session once init commands finish.
pub const INIT_MARKER: &str = "INIT_DONE";

/// Per-command budget for init commands to reach their prompt sentinel.
const INIT_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// How often the init sentinel poll re-captures the pane.
const INIT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Result of the pre-attach branch check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachCheck {
    /// Safe to hand the terminal over
    Ready { tmux_session: String },
    /// Branch is behind base; the UI decides whether to run the merge protocol
    BranchBehind { behind: u64 },
}

/// Result of a successful completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompleteOutcome {
    pub pr_url: Option<String>,
}

/// Resources provisioned so far by `create_and_start`, for rollback.
#[derive(Debug, Default)]
struct Provisioned {
    worktree: bool,
    remote_branch: bool,
    tmux_session: bool,
}

/// Drives session creation, attach checks, pause, completion, teardown.
pub struct SessionLifecycle<R, C> {
    tmux: TmuxClient<R>,
    git: GitClient<R>,
    beads: BeadsClient<R>,
    gh: GhClient<R>,
    clipboard: Clipboard<R>,
    config: Config,
    project_root: PathBuf,
    clock: C,
}

impl<R: CommandRunner, C: Clock> SessionLifecycle<R, C> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        tmux: TmuxClient<R>,
        git: GitClient<R>,
        beads: BeadsClient<R>,
        gh: GhClient<R>,
        clipboard: Clipboard<R>,
        config: Config,
        project_root: PathBuf,
        clock: C,
    ) -> Self {
        Self {
            tmux,
            git,
            beads,
            gh,
            clipboard,
            config,
            project_root,
            clock,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Activate a task: worktree, branch, tmux session, init, assistant.
    ///
    /// Preconditions: the task exists in the issue store and no session is
    /// live under the task's branch name. On any failure, everything
    /// provisioned so far is rolled back in reverse; rollback failures are
    /// attached to the primary error.
    pub async fn create_and_start(
        &self,
        task_id: &TaskId,
        initial_prompt: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<Session, OrchestratorError> {
        // Existence check; the task body is not needed for provisioning
        self.beads.show(task_id).await?;
        let branch = self.config.branch_name(task_id.as_str());
        let worktree = self.config.worktree_path(&self.project_root, task_id.as_str());

        if self.tmux.has_session(&branch).await? {
            return Err(OrchestratorError::Conflict(format!(
                "session {} already exists",
                branch
            )));
        }
        if worktree.exists() {
            return Err(OrchestratorError::Conflict(format!(
                "worktree path {} already exists",
                worktree.display()
            )));
        }

        tracing::info!(%task_id, %branch, worktree = %worktree.display(), "starting session");

        let mut provisioned = Provisioned::default();
        match self
            .provision(task_id, &branch, &worktree, initial_prompt, &mut provisioned, cancel)
            .await
        {
            Ok(session) => Ok(session),
            Err(primary) => {
                let failures = self.rollback(&provisioned, &branch, &worktree).await;
                Err(primary.with_compensation(failures))
            }
        }
    }

    async fn provision(
        &self,
        task_id: &TaskId,
        branch: &str,
        worktree: &Path,
        initial_prompt: Option<&str>,
        provisioned: &mut Provisioned,
        cancel: &CancellationToken,
    ) -> Result<Session, OrchestratorError> {
        let git_cfg = &self.config.git;

        self.git
            .create_worktree(&self.project_root, worktree, branch, &git_cfg.base_branch)
            .await?;
        provisioned.worktree = true;
        check_cancel(cancel)?;

        // Pushing at creation makes the branch visible to the issue tool's
        // sync model; local mode skips it.
        if git_cfg.workflow_mode == GitWorkflowMode::Origin
            && git_cfg.push_branch_on_create
            && git_cfg.push_enabled
        {
            self.git
                .push_upstream(worktree, &git_cfg.remote, branch)
                .await?;
            provisioned.remote_branch = true;
        }
        check_cancel(cancel)?;

        self.tmux.new_session(branch, worktree).await?;
        provisioned.tmux_session = true;
        check_cancel(cancel)?;

        // Background task windows go up before init runs; each one spins on
        // the init marker so the tasks start only when init completes.
        for (i, task_cmd) in self.config.session.background_tasks.iter().enumerate() {
            let window = format!("bg-{}", i);
            let gated = gated_command(branch, task_cmd);
            self.tmux.new_window(branch, &window, Some(&gated)).await?;
        }

        self.run_init_commands(branch, cancel).await?;
        self.tmux.set_environment(branch, INIT_MARKER, "1").await?;

        let assistant = assistant_invocation(&self.config.session, initial_prompt);
        self.tmux.send_keys(branch, &assistant, true).await?;

        tracing::info!(%task_id, branch, "session provisioned");

        Ok(Session {
            task_id: task_id.clone(),
            worktree: worktree.to_path_buf(),
            branch: branch.to_string(),
            tmux_session: branch.to_string(),
            state: SessionState::Busy,
            started_at_ms: self.clock.epoch_ms(),
            last_output: None,
            last_error: None,
        })
    }

    /// Run configured init commands in the main window, waiting for each
    /// to finish via an exit-code sentinel echoed after the command.
    async fn run_init_commands(
        &self,
        session: &str,
        cancel: &CancellationToken,
    ) -> Result<(), OrchestratorError> {
        for (i, command) in self.config.worktree.init_commands.iter().enumerate() {
            check_cancel(cancel)?;
            self.tmux.send_keys(session, command, true).await?;

            // The sentinel is typed split by a quoted suffix so only the
            // *output* line contains the joined marker, never the echoed
            // command itself.
            let prefix = format!("__AZ_RC_{}_", i);
            let typed = format!("echo {}$?\"__\"", prefix);
            self.tmux.send_keys(session, &typed, true).await?;

            match self.wait_for_sentinel(session, &prefix, cancel).await? {
                0 => {}
                code => {
                    tracing::warn!(session, %command, code, "init command failed");
                    if !self.config.worktree.continue_on_failure {
                        return Err(OrchestratorError::Tool {
                            op: format!("init command `{}`", command),
                            stderr: format!("exit code {}", code),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    /// Poll the pane until `<prefix><code>__` shows up; returns the code.
    async fn wait_for_sentinel(
        &self,
        session: &str,
        prefix: &str,
        cancel: &CancellationToken,
    ) -> Result<i32, OrchestratorError> {
        let deadline = tokio::time::Instant::now() + INIT_COMMAND_TIMEOUT;
        loop {
            check_cancel(cancel)?;
            if tokio::time::Instant::now() >= deadline {
                return Err(OrchestratorError::Timeout(format!(
                    "init command in {} did not finish",
                    session
                )));
            }
            tokio::time::sleep(INIT_POLL_INTERVAL).await;

            let output = self.tmux.capture_pane(session, 50).await?;
            if let Some(code) = find_sentinel_code(&output, prefix) {
                return Ok(code);
            }
        }
    }

    /// Pre-attach check: refuse when the branch is behind base.
    pub async fn attach_check(&self, session: &Session) -> Result<AttachCheck, OrchestratorError> {
        if !self.tmux.has_session(&session.tmux_session).await? {
            return Err(OrchestratorError::NotFound(format!(
                "tmux session {}",
                session.tmux_session
            )));
        }

        let base_ref = self.base_ref(&session.worktree).await;
        let behind = self
            .git
            .rev_list_count(&session.worktree, &format!("HEAD..{}", base_ref))
            .await?;
        if behind > 0 {
            Ok(AttachCheck::BranchBehind { behind })
        } else {
            Ok(AttachCheck::Ready {
                tmux_session: session.tmux_session.clone(),
            })
        }
    }

    /// The ref the task branch is compared against, fetching first when
    /// enabled. A failed fetch degrades to comparing the local ref.
    pub(crate) async fn base_ref(&self, worktree: &std::path::Path) -> String {
        let git_cfg = &self.config.git;
        match git_cfg.workflow_mode {
            GitWorkflowMode::Local => git_cfg.base_branch.clone(),
            GitWorkflowMode::Origin => {
                if git_cfg.fetch_enabled {
                    if let Err(e) = self.git.fetch(worktree, &git_cfg.remote).await {
                        tracing::warn!(error = %e, "fetch failed, comparing against local base");
                        return git_cfg.base_branch.clone();
                    }
                }
                format!("{}/{}", git_cfg.remote, git_cfg.base_branch)
            }
        }
    }

    /// Interrupt the assistant. The coordinator marks the session `Paused`
    /// optimistically; monitor evidence corrects it afterwards.
    pub async fn pause(&self, session: &Session) -> Result<(), OrchestratorError> {
        self.tmux.send_interrupt(&session.tmux_session).await?;
        Ok(())
    }

    /// Close the issue, optionally open a PR, then tear down.
    ///
    /// Teardown always runs; its failures (and PR-creation failures, which
    /// are not allowed to block teardown) are aggregated onto the result.
    pub async fn complete(
        &self,
        session: &Session,
        mode: CompleteMode,
    ) -> Result<CompleteOutcome, OrchestratorError> {
        let task = self.beads.show(&session.task_id).await?;
        self.beads
            .close(&session.task_id, Some("completed"))
            .await?;

        let mut warnings = Vec::new();
        let mut pr_url = None;
        if mode == CompleteMode::WithPr && self.config.pr.enabled {
            match self.open_pr(session, &task).await {
                Ok(url) => pr_url = Some(url),
                Err(e) => warnings.push(format!("pr creation failed: {}", e)),
            }
        }

        warnings.extend(self.teardown(session).await);

        if warnings.is_empty() {
            Ok(CompleteOutcome { pr_url })
        } else {
            Err(OrchestratorError::Tool {
                op: format!("complete {}", session.task_id),
                stderr: "issue closed, but follow-up steps failed".to_string(),
            }
            .with_compensation(warnings))
        }
    }

    async fn open_pr(&self, session: &Session, task: &Task) -> Result<String, OrchestratorError> {
        let git_cfg = &self.config.git;
        if git_cfg.push_enabled {
            self.git
                .push_upstream(&session.worktree, &git_cfg.remote, &session.branch)
                .await?;
        }

        let request = PrRequest {
            title: format!("{}: {}", task.id, task.title),
            body: format!("Closes {}.\n\n{}", task.id, task.description),
            base: git_cfg.base_branch.clone(),
            draft: self.config.pr.auto_draft,
        };
        let url = self.gh.create_pr(&request).await?;

        if self.config.pr.auto_merge {
            if let Err(e) = self.gh.enable_auto_merge(&url).await {
                tracing::warn!(error = %e, "auto-merge could not be enabled");
            }
        }
        if let Err(e) = self.clipboard.copy(&url).await {
            tracing::debug!(error = %e, "clipboard copy failed");
        }
        Ok(url)
    }

    /// Tear down a session's tmux session, worktree, and branch.
    ///
    /// Dev servers are stopped by the dev-server manager before this runs.
    /// Every step is attempted; failures are described, not short-circuited.
    pub async fn teardown(&self, session: &Session) -> Vec<String> {
        let mut failures = Vec::new();

        if let Err(e) = self.tmux.kill_session(&session.tmux_session).await {
            failures.push(format!("kill session: {}", e));
        }
        if let Err(e) = self
            .git
            .delete_worktree(&self.project_root, &session.worktree)
            .await
        {
            failures.push(format!("delete worktree: {}", e));
        }
        if let Err(e) = self.git.delete_branch(&self.project_root, &session.branch).await {
            // The branch may simply be gone already; report only real breakage
            tracing::debug!(branch = %session.branch, error = %e, "branch delete failed");
        }

        if failures.is_empty() {
            tracing::info!(task_id = %session.task_id, "session torn down");
        } else {
            tracing::warn!(task_id = %session.task_id, ?failures, "session teardown incomplete");
        }
        failures
    }

    /// Undo `create_and_start` provisioning in reverse order, best effort.
    async fn rollback(&self, provisioned: &Provisioned, branch: &str, worktree: &Path) -> Vec<String> {
        let mut failures = Vec::new();

        if provisioned.tmux_session {
            if let Err(e) = self.tmux.kill_session(branch).await {
                failures.push(format!("kill session: {}", e));
            }
        }
        if provisioned.remote_branch {
            if let Err(e) = self
                .git
                .delete_remote_branch(&self.project_root, &self.config.git.remote, branch)
                .await
            {
                failures.push(format!("delete remote branch: {}", e));
            }
        }
        if provisioned.worktree {
            if let Err(e) = self.git.delete_worktree(&self.project_root, worktree).await {
                failures.push(format!("delete worktree: {}", e));
            }
            if let Err(e) = self.git.delete_branch(&self.project_root, branch).await {
                tracing::debug!(branch, error = %e, "branch delete failed during rollback");
            }
        }

        tracing::warn!(branch, ?failures, "session start rolled back");
        failures
    }
}

/// Build the assistant invocation for the main window, with the prompt as
/// a single escaped double-quoted argument.
pub(crate) fn assistant_invocation(
    session: &az_core::config::SessionConfig,
    prompt: Option<&str>,
) -> String {
    let mut invocation = session.assistant_command.clone();
    for flag in &session.assistant_flags {
        invocation.push(' ');
        invocation.push_str(flag);
    }
    if let Some(prompt) = prompt {
        invocation.push(' ');
        invocation.push_str(&quote_double(prompt));
    }
    invocation
}

/// Wrap a background task so it waits for the init marker before running.
fn gated_command(session: &str, task_cmd: &str) -> String {
    format!(
        "sh -c \"until tmux show-environment -t {} {} >/dev/null 2>&1; do sleep 1; done; {}\"",
        escape_double_quoted(session),
        INIT_MARKER,
        escape_double_quoted(task_cmd)
    )
}

/// Find `<prefix><code>__` in pane output and parse the exit code.
fn find_sentinel_code(output: &str, prefix: &str) -> Option<i32> {
    // Search from the end; the marker line is the most recent output
    for line in output.lines().rev() {
        if let Some(rest) = line.trim().strip_prefix(prefix) {
            if let Some(code_str) = rest.strip_suffix("__") {
                if let Ok(code) = code_str.parse::<i32>() {
                    return Some(code);
                }
            }
        }
    }
    None
}

fn check_cancel(cancel: &CancellationToken) -> Result<(), OrchestratorError> {
    if cancel.is_cancelled() {
        Err(OrchestratorError::Canceled)
    } else {
        Ok(())
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
