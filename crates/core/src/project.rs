// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Project records and the user-level project registry.
//!
//! A project is a directory that contains the issue tool's data directory.
//! The registry lives at `~/.config/azedarach/projects.json` and is the
//! only state Azedarach persists outside project directories.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Data directory owned by the issue tool. Opaque to the core except for
/// merge-conflict filtering.
pub const BEADS_DIR: &str = ".beads";

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("not a project (missing {BEADS_DIR}): {0}")]
    NotAProject(PathBuf),
    #[error("project already registered: {0}")]
    AlreadyRegistered(String),
    #[error("unknown project: {0}")]
    Unknown(String),
    #[error("failed to access registry {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid registry {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// A registered project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Display name (defaults to the directory basename)
    pub name: String,
    /// Absolute filesystem path of the project root
    pub path: PathBuf,
    /// Issue id prefix used by this project (e.g. `az`)
    pub prefix: String,
}

impl Project {
    /// Probe a directory for the issue tool's data directory.
    ///
    /// Registration and project switching both go through this check; the
    /// core never creates `.beads` itself.
    pub fn discover(path: &Path) -> Result<Self, ProjectError> {
        if !path.join(BEADS_DIR).is_dir() {
            return Err(ProjectError::NotAProject(path.to_path_buf()));
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self {
            prefix: name.chars().take(2).collect(),
            name,
            path: path.to_path_buf(),
        })
    }
}

/// On-disk project registry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectRegistry {
    pub projects: Vec<Project>,
    /// Name of the currently selected project, if any
    pub current: Option<String>,
}

impl ProjectRegistry {
    /// Default registry path: `~/.config/azedarach/projects.json`.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("azedarach")
            .join("projects.json")
    }

    /// Load the registry, or an empty one if the file does not exist.
    pub fn load(path: &Path) -> Result<Self, ProjectError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|source| ProjectError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ProjectError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Persist the registry, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> Result<(), ProjectError> {
        let io_err = |source| ProjectError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|source| ProjectError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, json).map_err(io_err)
    }

    pub fn get(&self, name: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.name == name)
    }

    /// Register a project after discovery validation.
    pub fn add(&mut self, path: &Path) -> Result<Project, ProjectError> {
        let project = Project::discover(path)?;
        if self.get(&project.name).is_some() {
            return Err(ProjectError::AlreadyRegistered(project.name));
        }
        if self.current.is_none() {
            self.current = Some(project.name.clone());
        }
        self.projects.push(project.clone());
        Ok(project)
    }

    pub fn remove(&mut self, name: &str) -> Result<Project, ProjectError> {
        let idx = self
            .projects
            .iter()
            .position(|p| p.name == name)
            .ok_or_else(|| ProjectError::Unknown(name.to_string()))?;
        if self.current.as_deref() == Some(name) {
            self.current = None;
        }
        Ok(self.projects.remove(idx))
    }

    pub fn switch(&mut self, name: &str) -> Result<Project, ProjectError> {
        let project = self
            .get(name)
            .cloned()
            .ok_or_else(|| ProjectError::Unknown(name.to_string()))?;
        self.current = Some(project.name.clone());
        Ok(project)
    }

    /// The currently selected project, if any.
    pub fn current_project(&self) -> Option<&Project> {
        self.current.as_deref().and_then(|name| self.get(name))
    }
}

#[cfg(test)]
#[path = "project_tests.rs"]
mod tests;
