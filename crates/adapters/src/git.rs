// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed git client: worktree lifecycle, branch state, and merge probing.
//!
//! The merge probe (`git merge-tree --write-tree`) is a read-only overlay
//! merge; it never touches the working tree, which is what makes it safe to
//! run before every destructive merge decision.

use crate::runner::{CmdOutput, CmdSpec, CommandRunner, GIT_NETWORK_TIMEOUT, GIT_TIMEOUT};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GitError {
    #[error("git {op} failed in {worktree}: {message}")]
    Command {
        op: &'static str,
        worktree: String,
        message: String,
    },
    #[error("git {op} timed out in {worktree}")]
    Timeout { op: &'static str, worktree: String },
    #[error("could not parse git {op} output: {message}")]
    Parse { op: &'static str, message: String },
}

/// Result of an in-memory merge probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeProbe {
    CleanMerge,
    /// Paths that would conflict, unfiltered
    Conflicts(Vec<String>),
}

/// Client for git and git-worktree operations.
#[derive(Clone)]
pub struct GitClient<R> {
    runner: R,
}

impl<R: CommandRunner> GitClient<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    async fn git(
        &self,
        op: &'static str,
        workdir: &Path,
        args: &[&str],
        timeout: Duration,
    ) -> Result<CmdOutput, GitError> {
        let spec = CmdSpec::new("git")
            .args(args.to_vec())
            .cwd(workdir)
            .timeout(timeout);
        self.runner.run(spec).await.map_err(|e| {
            if e.is_timeout() {
                GitError::Timeout {
                    op,
                    worktree: workdir.display().to_string(),
                }
            } else {
                GitError::Command {
                    op,
                    worktree: workdir.display().to_string(),
                    message: e.to_string(),
                }
            }
        })
    }

    async fn git_ok(
        &self,
        op: &'static str,
        workdir: &Path,
        args: &[&str],
        timeout: Duration,
    ) -> Result<CmdOutput, GitError> {
        let output = self.git(op, workdir, args, timeout).await?;
        if !output.success() {
            return Err(GitError::Command {
                op,
                worktree: workdir.display().to_string(),
                message: output.stderr.trim().to_string(),
            });
        }
        Ok(output)
    }

    /// Create a worktree at `path` on a new branch off `base`.
    pub async fn create_worktree(
        &self,
        repo: &Path,
        path: &Path,
        branch: &str,
        base: &str,
    ) -> Result<(), GitError> {
        let path_str = path.display().to_string();
        self.git_ok(
            "worktree-add",
            repo,
            &["worktree", "add", "-b", branch, &path_str, base],
            GIT_TIMEOUT,
        )
        .await?;
        Ok(())
    }

    /// Remove a worktree and prune its administrative files.
    pub async fn delete_worktree(&self, repo: &Path, path: &Path) -> Result<(), GitError> {
        let path_str = path.display().to_string();
        self.git_ok(
            "worktree-remove",
            repo,
            &["worktree", "remove", "--force", &path_str],
            GIT_TIMEOUT,
        )
        .await?;
        Ok(())
    }

    /// Delete a local branch (compensation path; branch may be unmerged).
    pub async fn delete_branch(&self, repo: &Path, branch: &str) -> Result<(), GitError> {
        self.git_ok("branch-delete", repo, &["branch", "-D", branch], GIT_TIMEOUT)
            .await?;
        Ok(())
    }

    pub async fn current_branch(&self, workdir: &Path) -> Result<String, GitError> {
        let output = self
            .git_ok(
                "current-branch",
                workdir,
                &["rev-parse", "--abbrev-ref", "HEAD"],
                GIT_TIMEOUT,
            )
            .await?;
        Ok(output.stdout.trim().to_string())
    }

    pub async fn fetch(&self, workdir: &Path, remote: &str) -> Result<(), GitError> {
        self.git_ok("fetch", workdir, &["fetch", remote], GIT_NETWORK_TIMEOUT)
            .await?;
        Ok(())
    }

    /// Fetch a specific refspec from a remote.
    pub async fn fetch_ref(
        &self,
        workdir: &Path,
        remote: &str,
        refspec: &str,
    ) -> Result<(), GitError> {
        self.git_ok(
            "fetch-ref",
            workdir,
            &["fetch", remote, refspec],
            GIT_NETWORK_TIMEOUT,
        )
        .await?;
        Ok(())
    }

    /// Count commits in a revision range (e.g. `main..HEAD`).
    pub async fn rev_list_count(&self, workdir: &Path, range: &str) -> Result<u64, GitError> {
        let output = self
            .git_ok(
                "rev-list-count",
                workdir,
                &["rev-list", "--count", range],
                GIT_TIMEOUT,
            )
            .await?;
        output
            .stdout
            .trim()
            .parse()
            .map_err(|_| GitError::Parse {
                op: "rev-list-count",
                message: format!("not a count: {:?}", output.stdout.trim()),
            })
    }

    pub async fn pull(&self, workdir: &Path, remote: &str, branch: &str) -> Result<(), GitError> {
        self.git_ok(
            "pull",
            workdir,
            &["pull", remote, branch],
            GIT_NETWORK_TIMEOUT,
        )
        .await?;
        Ok(())
    }

    /// Push a branch and set its upstream.
    pub async fn push_upstream(
        &self,
        workdir: &Path,
        remote: &str,
        branch: &str,
    ) -> Result<(), GitError> {
        self.git_ok(
            "push",
            workdir,
            &["push", "-u", remote, branch],
            GIT_NETWORK_TIMEOUT,
        )
        .await?;
        Ok(())
    }

    /// Delete a remote branch (best-effort compensation).
    pub async fn delete_remote_branch(
        &self,
        workdir: &Path,
        remote: &str,
        branch: &str,
    ) -> Result<(), GitError> {
        self.git_ok(
            "push-delete",
            workdir,
            &["push", remote, "--delete", branch],
            GIT_NETWORK_TIMEOUT,
        )
        .await?;
        Ok(())
    }

    /// Probe what merging `base` into HEAD would do, without touching the
    /// working tree.
    ///
    /// `git merge-tree --write-tree` performs the merge against an
    /// in-memory index: exit 0 means clean, exit 1 lists conflicted paths
    /// (one per line after the tree OID with `--name-only`).
    pub async fn merge_tree_probe(
        &self,
        workdir: &Path,
        base: &str,
    ) -> Result<MergeProbe, GitError> {
        let output = self
            .git(
                "merge-tree",
                workdir,
                &["merge-tree", "--write-tree", "--name-only", "HEAD", base],
                GIT_TIMEOUT,
            )
            .await?;
        match output.exit_code {
            0 => Ok(MergeProbe::CleanMerge),
            1 => {
                // First line is the written tree OID; the rest are paths.
                let files = output
                    .stdout
                    .lines()
                    .skip(1)
                    .map(str::trim)
                    .filter(|l| !l.is_empty())
                    .map(String::from)
                    .collect();
                Ok(MergeProbe::Conflicts(files))
            }
            _ => Err(GitError::Command {
                op: "merge-tree",
                worktree: workdir.display().to_string(),
                message: output.stderr.trim().to_string(),
            }),
        }
    }

    /// Merge `base` into the current branch, no editor.
    ///
    /// Callers must have probed first; this fails if conflicts arise.
    pub async fn merge_commit(&self, workdir: &Path, base: &str) -> Result<(), GitError> {
        self.git_ok("merge", workdir, &["merge", "--no-edit", base], GIT_TIMEOUT)
            .await?;
        Ok(())
    }

    /// Abort an in-progress merge, restoring the pre-merge tree.
    pub async fn merge_abort(&self, workdir: &Path) -> Result<(), GitError> {
        self.git_ok("merge-abort", workdir, &["merge", "--abort"], GIT_TIMEOUT)
            .await?;
        Ok(())
    }

    /// Start a merge expected to conflict, leaving markers in the tree.
    ///
    /// A conflicted exit (code 1) is the intended outcome and returns `Ok`;
    /// any other failure is surfaced.
    pub async fn begin_conflicted_merge(&self, workdir: &Path, base: &str) -> Result<(), GitError> {
        let output = self
            .git("merge", workdir, &["merge", base], GIT_TIMEOUT)
            .await?;
        if output.success() || output.exit_code == 1 {
            return Ok(());
        }
        Err(GitError::Command {
            op: "merge",
            worktree: workdir.display().to_string(),
            message: output.stderr.trim().to_string(),
        })
    }

    /// Paths of all worktrees attached to a repository, the main checkout
    /// included.
    pub async fn list_worktrees(&self, repo: &Path) -> Result<Vec<std::path::PathBuf>, GitError> {
        let output = self
            .git_ok(
                "worktree-list",
                repo,
                &["worktree", "list", "--porcelain"],
                GIT_TIMEOUT,
            )
            .await?;
        Ok(output
            .stdout
            .lines()
            .filter_map(|line| line.strip_prefix("worktree "))
            .map(std::path::PathBuf::from)
            .collect())
    }

    /// `git status --porcelain` output, used to verify probe purity.
    pub async fn status_porcelain(&self, workdir: &Path) -> Result<String, GitError> {
        let output = self
            .git_ok("status", workdir, &["status", "--porcelain"], GIT_TIMEOUT)
            .await?;
        Ok(output.stdout)
    }
}

#[cfg(test)]
#[path = "git_tests.rs"]
mod tests;
