// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use anyhow::Result;
use az_core::ProjectRegistry;
use clap::{Args, Subcommand};
use std::path::PathBuf;

#[derive(Args)]
pub struct ProjectArgs {
    #[command(subcommand)]
    pub command: ProjectCommand,
}

#[derive(Subcommand)]
pub enum ProjectCommand {
    /// Register a project directory (must contain the issue data dir)
    Add {
        /// Directory to register (defaults to the current directory)
        path: Option<PathBuf>,
    },
    /// List registered projects
    List,
    /// Remove a project from the registry
    Remove { name: String },
    /// Make a project the current one
    Switch { name: String },
}

pub async fn run(args: ProjectArgs) -> Result<()> {
    let registry_path = ProjectRegistry::default_path();
    let mut registry = ProjectRegistry::load(&registry_path)?;

    match args.command {
        ProjectCommand::Add { path } => {
            let dir = match path {
                Some(path) => path,
                None => std::env::current_dir()?,
            };
            let dir = std::fs::canonicalize(&dir)?;
            let project = registry.add(&dir)?;
            registry.save(&registry_path)?;
            println!("added {} ({})", project.name, project.path.display());
        }
        ProjectCommand::List => {
            if registry.projects.is_empty() {
                println!("no projects registered");
            }
            for project in &registry.projects {
                let marker = if registry.current.as_deref() == Some(project.name.as_str()) {
                    "*"
                } else {
                    " "
                };
                println!("{} {}  {}", marker, project.name, project.path.display());
            }
        }
        ProjectCommand::Remove { name } => {
            let removed = registry.remove(&name)?;
            registry.save(&registry_path)?;
            println!("removed {}", removed.name);
        }
        ProjectCommand::Switch { name } => {
            let project = registry.switch(&name)?;
            registry.save(&registry_path)?;
            println!("current project: {}", project.name);
        }
    }
    Ok(())
}
