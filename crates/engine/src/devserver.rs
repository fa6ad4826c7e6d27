// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dev-server lifecycle: idempotent start/stop/restart/toggle and
//! recovery from a window scan.
//!
//! Server records persist across stop/start cycles (a stopped server keeps
//! its row with `status = Stopped`) and are destroyed only on session
//! teardown.

use crate::allocator::PortAllocator;
use crate::error::OrchestratorError;
use az_adapters::{CommandRunner, PortProbe, TmuxClient};
use az_core::{
    escape_double_quoted, Clock, Config, DevServer, DevServerStatus, ServerKey, Session, TaskId,
};
use indexmap::IndexMap;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// Grace between interrupting a server and killing its window.
const STOP_GRACE: Duration = Duration::from_millis(500);

/// Manages dev servers for all sessions of a project.
pub struct DevServerManager<R, P, C> {
    tmux: TmuxClient<R>,
    allocator: Arc<PortAllocator<P>>,
    config: Config,
    clock: C,
    servers: Mutex<IndexMap<ServerKey, DevServer>>,
}

impl<R: CommandRunner, P: PortProbe, C: Clock> DevServerManager<R, P, C> {
    pub fn new(
        tmux: TmuxClient<R>,
        allocator: Arc<PortAllocator<P>>,
        config: Config,
        clock: C,
    ) -> Self {
        Self {
            tmux,
            allocator,
            config,
            clock,
            servers: Mutex::new(IndexMap::new()),
        }
    }

    pub fn allocator(&self) -> &Arc<PortAllocator<P>> {
        &self.allocator
    }

    /// Current record for one server.
    pub fn get(&self, key: &ServerKey) -> Option<DevServer> {
        self.servers.lock().get(key).cloned()
    }

    /// All records, in creation order.
    pub fn list(&self) -> Vec<DevServer> {
        self.servers.lock().values().cloned().collect()
    }

    /// Records belonging to one task.
    pub fn list_for(&self, task_id: &TaskId) -> Vec<DevServer> {
        self.servers
            .lock()
            .values()
            .filter(|s| &s.task_id == task_id)
            .cloned()
            .collect()
    }

    /// Fold a monitor observation into the record.
    pub fn apply_status(
        &self,
        key: &ServerKey,
        status: DevServerStatus,
        error: Option<String>,
    ) -> Option<DevServer> {
        let mut servers = self.servers.lock();
        let server = servers.get_mut(key)?;
        server.status = status;
        if error.is_some() {
            server.last_error = error;
        }
        Some(server.clone())
    }

    /// Start a server by its configured name. Idempotent: a running server
    /// is returned unchanged.
    pub async fn start(
        &self,
        session: &Session,
        name: &str,
    ) -> Result<DevServer, OrchestratorError> {
        let key = ServerKey::new(session.task_id.clone(), name);
        if let Some(existing) = self.get(&key) {
            if existing.status.is_running() {
                tracing::debug!(%key, "dev server already running");
                return Ok(existing);
            }
        }

        let def = self
            .config
            .server_def(name)
            .ok_or_else(|| {
                OrchestratorError::NotFound(format!("no dev server named {} in config", name))
            })?
            .clone();

        // The session normally exists already; recreate it if the user
        // starts a server against a torn-down session.
        if !self.tmux.has_session(&session.tmux_session).await? {
            self.tmux
                .new_session(&session.tmux_session, &session.worktree)
                .await?;
        }

        let port = match def.ports.first() {
            Some(port_def) => {
                let port = self.allocator.allocate(key.clone()).await?;
                // Session-scoped env plus an in-window export below, so the
                // value is visible regardless of tmux version behavior.
                self.tmux
                    .set_environment(&session.tmux_session, &port_def.env_var, &port.to_string())
                    .await?;
                if def.ports.len() > 1 {
                    tracing::debug!(%key, "multiple port defs; only the first is allocated");
                }
                Some((port_def.env_var.clone(), port))
            }
            None => None,
        };

        let window = DevServer::window_name(name);
        let command = window_command(&def.command, port.as_ref());
        let window_result = self
            .tmux
            .new_window(&session.tmux_session, &window, Some(&command))
            .await;
        if let Err(e) = window_result {
            // Roll the reservation back so a retry can claim the port
            self.allocator.release(&key);
            return Err(e.into());
        }

        let record = DevServer {
            task_id: session.task_id.clone(),
            name: name.to_string(),
            command: def.command.clone(),
            port: port.map(|(_, p)| p),
            status: DevServerStatus::Starting,
            window,
            last_error: None,
            started_at_ms: self.clock.epoch_ms(),
        };
        tracing::info!(%key, port = ?record.port, "dev server starting");
        self.servers.lock().insert(key, record.clone());
        Ok(record)
    }

    /// Stop a server. Idempotent: unknown or stopped servers are fine.
    pub async fn stop(
        &self,
        session: &Session,
        name: &str,
    ) -> Result<Option<DevServer>, OrchestratorError> {
        let key = ServerKey::new(session.task_id.clone(), name);
        let Some(record) = self.get(&key) else {
            return Ok(None);
        };
        if record.status == DevServerStatus::Stopped {
            return Ok(Some(record));
        }

        let target = format!("{}:{}", session.tmux_session, record.window);
        if let Err(e) = self.tmux.send_interrupt(&target).await {
            tracing::debug!(%key, error = %e, "interrupt failed, killing window anyway");
        }
        tokio::time::sleep(STOP_GRACE).await;
        self.tmux
            .kill_window(&session.tmux_session, &record.window)
            .await?;
        self.allocator.release(&key);

        let mut servers = self.servers.lock();
        let Some(server) = servers.get_mut(&key) else {
            return Ok(None);
        };
        server.status = DevServerStatus::Stopped;
        server.port = None;
        tracing::info!(%key, "dev server stopped");
        Ok(Some(server.clone()))
    }

    /// Stop then start with the same parameters.
    pub async fn restart(
        &self,
        session: &Session,
        name: &str,
    ) -> Result<DevServer, OrchestratorError> {
        self.stop(session, name).await?;
        self.start(session, name).await
    }

    /// Start if stopped, stop if running.
    pub async fn toggle(
        &self,
        session: &Session,
        name: &str,
    ) -> Result<DevServer, OrchestratorError> {
        let key = ServerKey::new(session.task_id.clone(), name);
        let running = self
            .get(&key)
            .map(|s| s.status.is_running())
            .unwrap_or(false);
        if running {
            let stopped = self.stop(session, name).await?;
            stopped.ok_or_else(|| {
                OrchestratorError::NotFound(format!("dev server {} vanished during toggle", key))
            })
        } else {
            self.start(session, name).await
        }
    }

    /// Stop every server of a task and drop their records (teardown path).
    ///
    /// All servers are attempted; failures are described and returned.
    pub async fn stop_all(&self, session: &Session) -> Vec<String> {
        let names: Vec<String> = self
            .list_for(&session.task_id)
            .into_iter()
            .map(|s| s.name)
            .collect();

        let mut failures = Vec::new();
        for name in names {
            if let Err(e) = self.stop(session, &name).await {
                failures.push(format!("stop dev server {}: {}", name, e));
            }
            let key = ServerKey::new(session.task_id.clone(), &name);
            self.allocator.release(&key);
            self.servers.lock().shift_remove(&key);
        }
        failures
    }

    /// Rebuild records and reservations from live `dev-*` windows.
    ///
    /// Called on coordinator boot. Recovered servers come back as
    /// `Unknown` until their monitors report; the allocator is rebuilt
    /// with exactly the recovered ports.
    pub async fn recover_from_scan(&self, sessions: &[Session]) -> Vec<DevServer> {
        let mut recovered = Vec::new();
        let mut reservations = Vec::new();

        for session in sessions {
            let windows = match self.tmux.list_windows(&session.tmux_session).await {
                Ok(windows) => windows,
                Err(e) => {
                    tracing::warn!(
                        session = %session.tmux_session,
                        error = %e,
                        "window scan failed"
                    );
                    continue;
                }
            };

            for window in windows {
                let Some(name) = DevServer::name_from_window(&window) else {
                    continue;
                };
                let key = ServerKey::new(session.task_id.clone(), name);

                // Port comes back from the session environment when the
                // server was started with a declared port.
                let mut port = None;
                if let Some(def) = self.config.server_def(name) {
                    if let Some(port_def) = def.ports.first() {
                        port = self
                            .tmux
                            .show_environment(&session.tmux_session, &port_def.env_var)
                            .await
                            .ok()
                            .flatten()
                            .and_then(|v| v.parse::<u16>().ok());
                    }
                }

                let record = DevServer {
                    task_id: session.task_id.clone(),
                    name: name.to_string(),
                    command: self
                        .config
                        .server_def(name)
                        .map(|d| d.command.clone())
                        .unwrap_or_default(),
                    port,
                    status: DevServerStatus::Unknown,
                    window: window.clone(),
                    last_error: None,
                    started_at_ms: self.clock.epoch_ms(),
                };
                if let Some(port) = port {
                    reservations.push((key.clone(), port));
                }
                tracing::info!(%key, ?port, "recovered dev server from scan");
                self.servers.lock().insert(key, record.clone());
                recovered.push(record);
            }
        }

        self.allocator.rebuild(reservations);
        recovered
    }
}

/// The in-window launch command: port export plus the configured command.
fn window_command(command: &str, port: Option<&(String, u16)>) -> String {
    match port {
        Some((env_var, port)) => format!(
            "sh -c \"export {}={}; {}\"",
            env_var,
            port,
            escape_double_quoted(command)
        ),
        None => command.to_string(),
    }
}

#[cfg(test)]
#[path = "devserver_tests.rs"]
mod tests;
