// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Update-from-base: behind detection, in-memory conflict probe, and
//! assistant-driven conflict resolution.
//!
//! The probe always runs before any destructive merge; its result is the
//! authoritative decision. Conflicts confined to the issue tool's data
//! directory are the sync layer's business and are filtered out.

use crate::error::OrchestratorError;
use crate::lifecycle::assistant_invocation;
use az_adapters::{CommandRunner, GitClient, MergeProbe, TmuxClient};
use az_core::{Config, GitWorkflowMode, Session, BEADS_DIR};

/// Name of the conflict-resolution window inside a session.
pub const MERGE_WINDOW: &str = "merge";

/// Result of one update-from-base pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    AlreadyUpToDate,
    CleanMerge,
    /// A real merge with markers is in progress and the assistant has been
    /// launched in the `merge` window to resolve these paths.
    ConflictsDetected { files: Vec<String> },
}

/// Drives the merge sub-protocol for one project.
pub struct MergeProtocol<R> {
    git: GitClient<R>,
    tmux: TmuxClient<R>,
    config: Config,
}

impl<R: CommandRunner> MergeProtocol<R> {
    pub fn new(git: GitClient<R>, tmux: TmuxClient<R>, config: Config) -> Self {
        Self { git, tmux, config }
    }

    /// Bring a session's branch up to date with the base branch.
    pub async fn update_from_base(
        &self,
        session: &Session,
    ) -> Result<MergeOutcome, OrchestratorError> {
        let worktree = &session.worktree;
        let base_ref = self.base_ref(worktree).await;

        let behind = self
            .git
            .rev_list_count(worktree, &format!("HEAD..{}", base_ref))
            .await?;
        if behind == 0 {
            return Ok(MergeOutcome::AlreadyUpToDate);
        }
        let ahead = self
            .git
            .rev_list_count(worktree, &format!("{}..HEAD", base_ref))
            .await?;
        tracing::info!(
            task_id = %session.task_id,
            ahead,
            behind,
            base = %base_ref,
            "branch is behind base"
        );

        let probe = self.git.merge_tree_probe(worktree, &base_ref).await?;
        let conflicts = match probe {
            MergeProbe::CleanMerge => Vec::new(),
            MergeProbe::Conflicts(files) => filter_beads_paths(files),
        };

        if conflicts.is_empty() {
            if let Err(e) = self.git.merge_commit(worktree, &base_ref).await {
                // The probe said clean but the merge conflicted anyway: the
                // base moved between probe and merge. Restore the tree and
                // report the conflict rather than leaving markers behind.
                if e.to_string().to_lowercase().contains("conflict") {
                    let _ = self.git.merge_abort(worktree).await;
                    tracing::warn!(
                        task_id = %session.task_id,
                        "base moved between probe and merge"
                    );
                    return Err(OrchestratorError::MergeConflict { files: conflicts });
                }
                return Err(e.into());
            }
            tracing::info!(task_id = %session.task_id, "merged base cleanly");
            return Ok(MergeOutcome::CleanMerge);
        }

        // Real merge with on-disk markers, then hand the mess to the
        // assistant in a dedicated window.
        self.git.begin_conflicted_merge(worktree, &base_ref).await?;
        let prompt = conflict_prompt(&base_ref, &conflicts);
        let invocation = assistant_invocation(&self.config.session, Some(&prompt));
        self.tmux
            .new_window(&session.tmux_session, MERGE_WINDOW, Some(&invocation))
            .await?;

        tracing::info!(
            task_id = %session.task_id,
            files = conflicts.len(),
            "conflict resolution assistant launched"
        );
        Ok(MergeOutcome::ConflictsDetected { files: conflicts })
    }

    async fn base_ref(&self, worktree: &std::path::Path) -> String {
        let git_cfg = &self.config.git;
        match git_cfg.workflow_mode {
            GitWorkflowMode::Local => git_cfg.base_branch.clone(),
            GitWorkflowMode::Origin => {
                if git_cfg.fetch_enabled {
                    if let Err(e) = self.git.fetch(worktree, &git_cfg.remote).await {
                        tracing::warn!(error = %e, "fetch failed, merging against local base");
                        return git_cfg.base_branch.clone();
                    }
                }
                format!("{}/{}", git_cfg.remote, git_cfg.base_branch)
            }
        }
    }
}

/// Drop conflict paths owned by the issue tool's data directory.
fn filter_beads_paths(files: Vec<String>) -> Vec<String> {
    files
        .into_iter()
        .filter(|f| {
            let path = f.trim_start_matches("./");
            path != BEADS_DIR && !path.starts_with(&format!("{}/", BEADS_DIR))
        })
        .collect()
}

fn conflict_prompt(base_ref: &str, files: &[String]) -> String {
    format!(
        "Merging {} produced conflicts in the following files:\n{}\n\
         Resolve each conflict, keep both sides' intent, then stage the \
         files and commit the merge.",
        base_ref,
        files
            .iter()
            .map(|f| format!("- {}", f))
            .collect::<Vec<_>>()
            .join("\n")
    )
}

#[cfg(test)]
#[path = "merge_tests.rs"]
mod tests;
