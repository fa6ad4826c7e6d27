// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::env::Clients;
use anyhow::{anyhow, Result};
use az_adapters::TcpPortProbe;
use az_core::{SystemClock, TaskId};
use az_engine::{DevServerManager, PortAllocator, DEFAULT_PORT_RANGE};
use clap::{Args, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args)]
pub struct DevArgs {
    #[command(subcommand)]
    pub command: DevCommand,
}

#[derive(Subcommand)]
pub enum DevCommand {
    /// Start a configured dev server for a task
    Start {
        task_id: String,
        /// Server name; required when more than one is configured
        #[arg(long, short = 'n')]
        name: Option<String>,
    },
    /// Stop a running dev server
    Stop {
        task_id: String,
        #[arg(long, short = 'n')]
        name: Option<String>,
    },
    /// Restart a dev server
    Restart {
        task_id: String,
        #[arg(long, short = 'n')]
        name: Option<String>,
    },
    /// Show dev server status for a task
    Status { task_id: String },
}

/// Dev commands act on the live tmux state directly: the manager rebuilds
/// its view from a window scan first, so it composes with a running board
/// the same way the board itself recovers after a restart.
pub async fn run(project_root: PathBuf, args: DevArgs) -> Result<()> {
    let clients = Clients::new(project_root)?;
    let manager = DevServerManager::new(
        clients.tmux.clone(),
        Arc::new(PortAllocator::new(TcpPortProbe::new(), DEFAULT_PORT_RANGE)),
        clients.config.clone(),
        SystemClock,
    );

    let (task_id, command) = match &args.command {
        DevCommand::Start { task_id, .. }
        | DevCommand::Stop { task_id, .. }
        | DevCommand::Restart { task_id, .. }
        | DevCommand::Status { task_id } => (TaskId::new(task_id), &args.command),
    };
    let session = clients.session_for(&task_id);

    if !clients.tmux.has_session(&session.tmux_session).await? {
        return Err(anyhow!("no session for {}; run `az start {}` first", task_id, task_id));
    }
    manager.recover_from_scan(std::slice::from_ref(&session)).await;

    match command {
        DevCommand::Start { name, .. } => {
            let name = resolve_name(&clients, name.as_deref())?;
            let server = manager.start(&session, &name).await?;
            match server.port {
                Some(port) => println!("{} starting on port {}", name, port),
                None => println!("{} starting", name),
            }
        }
        DevCommand::Stop { name, .. } => {
            let name = resolve_name(&clients, name.as_deref())?;
            match manager.stop(&session, &name).await? {
                Some(_) => println!("{} stopped", name),
                None => println!("{} was not running", name),
            }
        }
        DevCommand::Restart { name, .. } => {
            let name = resolve_name(&clients, name.as_deref())?;
            let server = manager.restart(&session, &name).await?;
            match server.port {
                Some(port) => println!("{} restarting on port {}", name, port),
                None => println!("{} restarting", name),
            }
        }
        DevCommand::Status { .. } => {
            let probe = TcpPortProbe::new();
            let servers = manager.list_for(&task_id);
            if servers.is_empty() {
                println!("no dev servers for {}", task_id);
            }
            for server in servers {
                let live = match server.port {
                    Some(port) => az_adapters::PortProbe::is_serving(&probe, port).await,
                    None => false,
                };
                let port = server
                    .port
                    .map(|p| p.to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "{:10} port {:5}  window {:10}  {}",
                    server.name,
                    port,
                    server.window,
                    if live { "serving" } else { "not serving" }
                );
            }
        }
    }
    Ok(())
}

/// Pick the server name: explicit, or the single configured one.
fn resolve_name(clients: &Clients, name: Option<&str>) -> Result<String> {
    if let Some(name) = name {
        return Ok(name.to_string());
    }
    let servers = &clients.config.dev_server.servers;
    match servers.len() {
        0 => Err(anyhow!("no dev servers configured")),
        1 => Ok(servers[0].name.clone()),
        _ => Err(anyhow!(
            "several dev servers configured ({}); pick one with --name",
            servers
                .iter()
                .map(|s| s.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        )),
    }
}
