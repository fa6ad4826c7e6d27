// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-dev-server watcher: window liveness plus TCP probe.

use az_adapters::{CommandRunner, PortProbe, TmuxClient, TmuxError};
use az_core::{DevServerStatus, Event, ServerKey};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Parameters for one dev-server monitor.
#[derive(Debug, Clone)]
pub struct ServerMonitorConfig {
    pub key: ServerKey,
    pub tmux_session: String,
    /// Window hosting the server (`dev-{name}`)
    pub window: String,
    /// Allocated port, when the server declares one
    pub port: Option<u16>,
    pub poll_interval: Duration,
    /// Consecutive non-serving probes tolerated while starting
    pub startup_grace_polls: u32,
    /// Consecutive check failures before the server is marked unknown
    pub max_check_failures: u32,
}

impl ServerMonitorConfig {
    pub fn new(key: ServerKey, tmux_session: impl Into<String>, port: Option<u16>) -> Self {
        let window = az_core::DevServer::window_name(&key.name);
        Self {
            key,
            tmux_session: tmux_session.into(),
            window,
            port,
            poll_interval: Duration::from_secs(1),
            startup_grace_polls: 10,
            max_check_failures: 3,
        }
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

/// Watch one dev server until cancelled.
///
/// Status is derived from two observations: whether the window still
/// exists, and whether the port accepts connections. Emits
/// [`Event::ServerStatusChanged`] on transitions and
/// [`Event::ServerMarkedUnknown`] when the checks themselves keep failing.
pub async fn run_server_monitor<R: CommandRunner, P: PortProbe>(
    config: ServerMonitorConfig,
    tmux: TmuxClient<R>,
    probe: P,
    events: mpsc::Sender<Event>,
    cancel: CancellationToken,
) {
    let ServerMonitorConfig {
        key,
        tmux_session,
        window,
        port,
        poll_interval,
        startup_grace_polls,
        max_check_failures,
    } = config;

    let mut last_status: Option<DevServerStatus> = None;
    let mut check_failures: u32 = 0;
    let mut not_serving_polls: u32 = 0;

    tracing::debug!(%key, tmux_session, window, ?port, "server monitor started");

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!(%key, "server monitor cancelled");
                return;
            }
            _ = tokio::time::sleep(poll_interval) => {}
        }

        let window_alive = match tmux.list_windows(&tmux_session).await {
            Ok(windows) => {
                check_failures = 0;
                windows.iter().any(|w| w == &window)
            }
            // Session gone means the window is gone too
            Err(TmuxError::NotFound(_)) => {
                check_failures = 0;
                false
            }
            Err(e) => {
                check_failures += 1;
                tracing::debug!(%key, check_failures, error = %e, "window check failed");
                if check_failures == max_check_failures {
                    let sent = events
                        .send(Event::ServerMarkedUnknown {
                            key: key.clone(),
                            reason: format!("window check failed: {}", e),
                        })
                        .await;
                    if sent.is_err() {
                        return;
                    }
                }
                continue;
            }
        };

        let (status, error) = if !window_alive {
            not_serving_polls = 0;
            (DevServerStatus::Stopped, None)
        } else {
            match port {
                None => (DevServerStatus::Running, None),
                Some(port) => {
                    if probe.is_serving(port).await {
                        not_serving_polls = 0;
                        (DevServerStatus::Running, None)
                    } else {
                        not_serving_polls += 1;
                        if not_serving_polls > startup_grace_polls {
                            (
                                DevServerStatus::Error,
                                Some(format!("port {} not responding", port)),
                            )
                        } else {
                            (DevServerStatus::Starting, None)
                        }
                    }
                }
            }
        };

        if last_status != Some(status) {
            last_status = Some(status);
            let sent = events
                .send(Event::ServerStatusChanged {
                    key: key.clone(),
                    status,
                    error,
                })
                .await;
            if sent.is_err() {
                return;
            }
        }
    }
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
