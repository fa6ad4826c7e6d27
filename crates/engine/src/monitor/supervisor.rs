// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Supervisor for session and dev-server monitors.
//!
//! One-for-one restarts with a crash budget: a monitor that keeps dying is
//! given up on, and the affected session or server is reported unknown so
//! the board shows it instead of silently losing observation.

use crate::error::OrchestratorError;
use az_core::{Clock, Event, ServerKey, TaskId};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Identity of a supervised monitor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MonitorKey {
    Session(TaskId),
    Server(ServerKey),
}

impl std::fmt::Display for MonitorKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MonitorKey::Session(task_id) => write!(f, "session {}", task_id),
            MonitorKey::Server(key) => write!(f, "server {}", key),
        }
    }
}

/// Spawns one monitor task observing until the given token cancels.
pub type MonitorFactory = Box<dyn Fn(CancellationToken) -> JoinHandle<()> + Send + Sync>;

struct Child {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
    factory: MonitorFactory,
    /// Crash times within the rolling budget window
    crashes: Vec<Instant>,
}

/// Supervises monitors, owning the upstream event subject toward the
/// coordinator. Monitors post to that subject only; the coordinator is
/// never called directly.
pub struct MonitorsSupervisor<C: Clock> {
    clock: C,
    events: mpsc::Sender<Event>,
    children: Mutex<HashMap<MonitorKey, Child>>,
    restart_limit: usize,
    restart_window: Duration,
}

/// How long shutdown waits for each monitor before giving up on it.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(2);

/// How often the sweeper looks for dead children.
const SWEEP_INTERVAL: Duration = Duration::from_millis(200);

impl<C: Clock> MonitorsSupervisor<C> {
    pub fn new(clock: C, events: mpsc::Sender<Event>) -> Self {
        Self {
            clock,
            events,
            children: Mutex::new(HashMap::new()),
            restart_limit: 3,
            restart_window: Duration::from_secs(60),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_budget(mut self, limit: usize, window: Duration) -> Self {
        self.restart_limit = limit;
        self.restart_window = window;
        self
    }

    /// The subject monitors post to. Factories capture a clone of this.
    pub fn events(&self) -> mpsc::Sender<Event> {
        self.events.clone()
    }

    /// Start a monitor under supervision.
    ///
    /// Starting a second monitor for a key that is still alive is an
    /// error; a finished child under the same key is replaced.
    pub fn start(&self, key: MonitorKey, factory: MonitorFactory) -> Result<(), OrchestratorError> {
        let mut children = self.children.lock();
        if let Some(existing) = children.get(&key) {
            if !existing.handle.is_finished() {
                return Err(OrchestratorError::Conflict(format!(
                    "monitor already running for {}",
                    key
                )));
            }
        }
        let cancel = CancellationToken::new();
        let handle = factory(cancel.clone());
        tracing::debug!(%key, "monitor started");
        children.insert(
            key,
            Child {
                cancel,
                handle,
                factory,
                crashes: Vec::new(),
            },
        );
        Ok(())
    }

    /// Stop and forget a monitor. No-op for unknown keys.
    pub async fn stop(&self, key: &MonitorKey) {
        let child = self.children.lock().remove(key);
        if let Some(child) = child {
            child.cancel.cancel();
            if tokio::time::timeout(SHUTDOWN_TIMEOUT, child.handle)
                .await
                .is_err()
            {
                tracing::warn!(%key, "monitor did not stop in time");
            }
            tracing::debug!(%key, "monitor stopped");
        }
    }

    pub fn is_running(&self, key: &MonitorKey) -> bool {
        self.children
            .lock()
            .get(key)
            .is_some_and(|c| !c.handle.is_finished())
    }

    /// Restart-or-give-up pass over dead children. Returns the events to
    /// post for children whose budget is exhausted.
    fn sweep(&self) -> Vec<Event> {
        let now = self.clock.now();
        let mut give_ups = Vec::new();
        let mut children = self.children.lock();

        let dead: Vec<MonitorKey> = children
            .iter()
            .filter(|(_, c)| c.handle.is_finished() && !c.cancel.is_cancelled())
            .map(|(k, _)| k.clone())
            .collect();

        for key in dead {
            let Some(child) = children.get_mut(&key) else {
                continue;
            };
            child.crashes.push(now);
            let window = self.restart_window;
            child
                .crashes
                .retain(|t| now.duration_since(*t) <= window);

            if child.crashes.len() <= self.restart_limit {
                tracing::warn!(%key, crashes = child.crashes.len(), "monitor died, restarting");
                let cancel = CancellationToken::new();
                child.handle = (child.factory)(cancel.clone());
                child.cancel = cancel;
            } else {
                tracing::error!(%key, "monitor crash budget exhausted");
                give_ups.push(match &key {
                    MonitorKey::Session(task_id) => Event::SessionMarkedUnknown {
                        task_id: task_id.clone(),
                        reason: "monitor crash budget exhausted".to_string(),
                    },
                    MonitorKey::Server(server_key) => Event::ServerMarkedUnknown {
                        key: server_key.clone(),
                        reason: "monitor crash budget exhausted".to_string(),
                    },
                });
                children.remove(&key);
            }
        }
        give_ups
    }

    /// Run the restart sweeper until cancelled.
    pub async fn run(self: Arc<Self>, cancel: CancellationToken) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(SWEEP_INTERVAL) => {}
            }
            for event in self.sweep() {
                if self.events.send(event).await.is_err() {
                    return;
                }
            }
        }
        self.shutdown().await;
    }

    /// Cancel all monitors and await them with a bounded timeout.
    pub async fn shutdown(&self) {
        let children: Vec<(MonitorKey, Child)> = self.children.lock().drain().collect();
        for (_, child) in &children {
            child.cancel.cancel();
        }
        for (key, child) in children {
            if tokio::time::timeout(SHUTDOWN_TIMEOUT, child.handle)
                .await
                .is_err()
            {
                tracing::warn!(%key, "monitor did not stop during shutdown");
            }
        }
        tracing::debug!("monitors supervisor shut down");
    }
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
