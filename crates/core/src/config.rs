// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-project configuration (`.azedarach.json`).
//!
//! Every field is optional in the file; defaults match the documented
//! behavior. The config is immutable for the lifetime of a run.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Config file name inside the project root.
pub const CONFIG_FILE: &str = ".azedarach.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Git workflow mode: whether branches live on a remote or only locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum GitWorkflowMode {
    Local,
    #[default]
    Origin,
}

/// Declared port of a dev server: the env var to inject and its fallback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortDef {
    pub env_var: String,
    pub default_port: u16,
}

/// One configured dev server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DevServerDef {
    pub name: String,
    pub command: String,
    #[serde(default)]
    pub ports: Vec<PortDef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WorktreeConfig {
    /// Template for worktree paths; `{project}` and `{bead-id}` are substituted
    pub path_template: String,
    /// Commands run once in the main window after session creation
    pub init_commands: Vec<String>,
    /// Keep going when an init command fails
    pub continue_on_failure: bool,
}

impl Default for WorktreeConfig {
    fn default() -> Self {
        Self {
            path_template: "../{project}-{bead-id}".to_string(),
            init_commands: vec!["direnv allow".to_string()],
            continue_on_failure: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionConfig {
    pub shell: String,
    pub tmux_prefix: String,
    /// Commands started in their own windows, gated on init completion
    pub background_tasks: Vec<String>,
    /// Assistant executable; opaque to the core
    pub assistant_command: String,
    /// Extra assistant flags (auto-approve etc.); opaque strings
    pub assistant_flags: Vec<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            shell: "zsh".to_string(),
            tmux_prefix: "C-a".to_string(),
            background_tasks: Vec::new(),
            assistant_command: "claude".to_string(),
            assistant_flags: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct DevServerConfig {
    pub servers: Vec<DevServerDef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GitConfig {
    pub workflow_mode: GitWorkflowMode,
    pub push_branch_on_create: bool,
    pub push_enabled: bool,
    pub fetch_enabled: bool,
    pub base_branch: String,
    pub remote: String,
    pub branch_prefix: String,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            workflow_mode: GitWorkflowMode::Origin,
            push_branch_on_create: true,
            push_enabled: true,
            fetch_enabled: true,
            base_branch: "main".to_string(),
            remote: "origin".to_string(),
            branch_prefix: "az-".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PrConfig {
    pub enabled: bool,
    pub auto_draft: bool,
    pub auto_merge: bool,
}

impl Default for PrConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            auto_draft: true,
            auto_merge: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BeadsConfig {
    pub sync_enabled: bool,
}

impl Default for BeadsConfig {
    fn default() -> Self {
        Self { sync_enabled: true }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PollingConfig {
    /// Issue cache refresh interval in milliseconds
    pub beads_refresh: u64,
    /// Session monitor poll interval in milliseconds
    pub session_monitor: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            beads_refresh: 30_000,
            session_monitor: 500,
        }
    }
}

/// Complete per-project configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub worktree: WorktreeConfig,
    pub session: SessionConfig,
    pub dev_server: DevServerConfig,
    pub git: GitConfig,
    pub pr: PrConfig,
    pub beads: BeadsConfig,
    pub polling: PollingConfig,
    pub theme: Option<String>,
}

impl Config {
    /// Load `.azedarach.json` from the project root, or defaults if absent.
    pub fn load(project_root: &Path) -> Result<Self, ConfigError> {
        let path = project_root.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse { path, source })
    }

    /// Branch name for a task: `{branchPrefix}{taskId}`.
    pub fn branch_name(&self, task_id: &str) -> String {
        format!("{}{}", self.git.branch_prefix, task_id)
    }

    /// Worktree path for a task, resolved against the project root.
    ///
    /// Substitutes `{project}` (project directory basename) and `{bead-id}`
    /// in the configured template; relative templates are anchored at the
    /// project root.
    pub fn worktree_path(&self, project_root: &Path, task_id: &str) -> PathBuf {
        let project = project_root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let rendered = self
            .worktree
            .path_template
            .replace("{project}", &project)
            .replace("{bead-id}", task_id);
        let rendered = PathBuf::from(rendered);
        if rendered.is_absolute() {
            rendered
        } else {
            project_root.join(rendered)
        }
    }

    /// Look up a configured dev server by logical name.
    pub fn server_def(&self, name: &str) -> Option<&DevServerDef> {
        self.dev_server.servers.iter().find(|s| s.name == name)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
