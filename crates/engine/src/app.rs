// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Application supervisor: wires the coordinator, the monitors supervisor
//! and its bridge, and the periodic issue refresh into one running system.
//!
//! Start order is coordinator first, then the monitors supervisor sweeper
//! with its event bridge into the coordinator's inbox. Shutdown cancels
//! the shared token and awaits every child with a bounded timeout.

use crate::coordinator::{Coordinator, CoordinatorDeps, CoordinatorMsg};
use crate::detector::Detector;
use crate::devserver::DevServerManager;
use crate::error::OrchestratorError;
use crate::lifecycle::SessionLifecycle;
use crate::lock::WorkspaceLock;
use crate::merge::MergeProtocol;
use crate::monitor::MonitorsSupervisor;
use az_adapters::{
    BeadsClient, Clipboard, CommandRunner, GhClient, GitClient, Notifier, PortProbe, TmuxClient,
};
use az_core::{BoardSnapshot, Clock, Command, CommandId, CommandOutcome, Config};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Inbox depth for the coordinator loop.
const INBOX_CAPACITY: usize = 256;

/// How long shutdown waits for children before abandoning them.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Handle UI/CLI code uses to issue commands to the running coordinator.
#[derive(Clone)]
pub struct CommandSender {
    tx: mpsc::Sender<CoordinatorMsg>,
}

impl CommandSender {
    /// Send a command and await its structured ack.
    pub async fn send(&self, command: Command) -> Result<CommandOutcome, OrchestratorError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(CoordinatorMsg::Command {
                id: CommandId::generate(),
                command,
                reply: Some(reply_tx),
            })
            .await
            .map_err(|_| OrchestratorError::Canceled)?;
        reply_rx.await.map_err(|_| OrchestratorError::Canceled)
    }

    /// Send a command without waiting for the ack (periodic ticks).
    pub async fn send_detached(&self, command: Command) {
        let _ = self
            .tx
            .send(CoordinatorMsg::Command {
                id: CommandId::generate(),
                command,
                reply: None,
            })
            .await;
    }
}

/// What the UI and CLI consume: a command channel and the snapshot stream.
#[derive(Clone)]
pub struct AppContext {
    pub commands: CommandSender,
    pub snapshots: watch::Receiver<BoardSnapshot>,
}

/// A running application; dropping without `shutdown` aborts children.
pub struct AppHandle {
    pub ctx: AppContext,
    cancel: CancellationToken,
    children: Vec<JoinHandle<()>>,
    // NOTE(lifetime): exclusive project lock, held until shutdown
    #[allow(dead_code)]
    lock: WorkspaceLock,
}

impl AppHandle {
    /// Cancel everything and await children with a bounded timeout.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        for child in self.children {
            if tokio::time::timeout(SHUTDOWN_TIMEOUT, child).await.is_err() {
                tracing::warn!("child did not stop within shutdown timeout");
            }
        }
        tracing::info!("application stopped");
    }

    /// Token CLI front-ends can use to propagate Ctrl-C.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

/// Start the full orchestration stack over one project.
pub fn start<R, P, N, C>(
    runner: R,
    probe: P,
    notifier: N,
    clock: C,
    config: Config,
    project_root: PathBuf,
) -> Result<AppHandle, OrchestratorError>
where
    R: CommandRunner,
    P: PortProbe,
    N: Notifier,
    C: Clock,
{
    let lock = WorkspaceLock::acquire(&project_root)?;
    let cancel = CancellationToken::new();

    let tmux = TmuxClient::new(runner.clone());
    let git = GitClient::new(runner.clone());
    let beads = BeadsClient::new(runner.clone(), &project_root);
    let gh = GhClient::new(runner.clone(), &project_root);
    let clipboard = Clipboard::new(runner.clone());

    let lifecycle = Arc::new(SessionLifecycle::new(
        tmux.clone(),
        git.clone(),
        beads.clone(),
        gh,
        clipboard,
        config.clone(),
        project_root.clone(),
        clock.clone(),
    ));
    let merge = Arc::new(MergeProtocol::new(git, tmux.clone(), config.clone()));
    let allocator = Arc::new(crate::allocator::PortAllocator::new(
        probe.clone(),
        crate::allocator::DEFAULT_PORT_RANGE,
    ));
    let devservers = Arc::new(DevServerManager::new(
        tmux.clone(),
        allocator,
        config.clone(),
        clock.clone(),
    ));

    let (inbox_tx, inbox_rx) = mpsc::channel(INBOX_CAPACITY);
    let (monitor_tx, mut monitor_rx) = mpsc::channel(INBOX_CAPACITY);
    let (snapshot_tx, snapshot_rx) = watch::channel(BoardSnapshot::default());
    let supervisor = Arc::new(MonitorsSupervisor::new(clock.clone(), monitor_tx));

    let deps = CoordinatorDeps {
        lifecycle,
        merge,
        devservers,
        beads,
        tmux,
        probe,
        notifier,
        detector: Detector::default(),
        supervisor: supervisor.clone(),
        config: config.clone(),
        project_root,
        clock,
    };

    let coordinator = Coordinator::new(
        deps,
        inbox_rx,
        inbox_tx.clone(),
        snapshot_tx,
        cancel.child_token(),
    );
    let coordinator_task = tokio::spawn(coordinator.run());

    // Bridge: monitor events become coordinator messages. Monitors never
    // talk to the coordinator directly.
    let bridge_tx = inbox_tx.clone();
    let bridge_cancel = cancel.child_token();
    let bridge_task = tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = bridge_cancel.cancelled() => break,
                event = monitor_rx.recv() => match event {
                    Some(event) => {
                        if bridge_tx.send(CoordinatorMsg::Event(event)).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                },
            }
        }
    });

    // Monitor restart sweeper
    let sweeper_task = tokio::spawn(supervisor.run(cancel.child_token()));

    // Periodic issue refresh
    let ticker_commands = CommandSender {
        tx: inbox_tx.clone(),
    };
    let ticker_cancel = cancel.child_token();
    let refresh_every = Duration::from_millis(config.polling.beads_refresh.max(1000));
    let ticker_task = tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = ticker_cancel.cancelled() => break,
                _ = tokio::time::sleep(refresh_every) => {
                    ticker_commands.send_detached(Command::RefreshIssues).await;
                }
            }
        }
    });

    tracing::info!("application started");
    Ok(AppHandle {
        ctx: AppContext {
            commands: CommandSender { tx: inbox_tx },
            snapshots: snapshot_rx,
        },
        cancel,
        children: vec![coordinator_task, bridge_task, sweeper_task, ticker_task],
        lock,
    })
}

#[cfg(test)]
#[path = "app_tests.rs"]
mod tests;
