// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-session pane watcher.

use crate::detector::Detector;
use az_adapters::{CommandRunner, TmuxClient};
use az_core::{Event, SessionState, SignalFile, TaskId};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Parameters for one session monitor.
#[derive(Debug, Clone)]
pub struct SessionMonitorConfig {
    pub task_id: TaskId,
    pub tmux_session: String,
    pub poll_interval: Duration,
    /// How many pane lines each capture requests
    pub capture_lines: u32,
    /// Consecutive capture failures before the session is marked unknown
    pub max_capture_failures: u32,
    /// Snippet lines carried on state-change events
    pub snippet_lines: usize,
}

impl SessionMonitorConfig {
    pub fn new(task_id: TaskId, tmux_session: impl Into<String>) -> Self {
        Self {
            task_id,
            tmux_session: tmux_session.into(),
            poll_interval: Duration::from_millis(500),
            capture_lines: 80,
            max_capture_failures: 3,
            snippet_lines: 3,
        }
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

/// Watch one session until cancelled.
///
/// Emits [`Event::SessionStateChanged`] when the classified state or the
/// visible tail changes, and [`Event::SessionMarkedUnknown`] after the
/// failure budget; polling then continues at a backed-off interval so a
/// recovering pane transitions the session back. Cancellation exits
/// promptly with no final emission.
pub async fn run_session_monitor<R: CommandRunner>(
    config: SessionMonitorConfig,
    tmux: TmuxClient<R>,
    detector: Detector,
    events: mpsc::Sender<Event>,
    cancel: CancellationToken,
) {
    let SessionMonitorConfig {
        task_id,
        tmux_session,
        poll_interval,
        capture_lines,
        max_capture_failures,
        snippet_lines,
    } = config;

    let backoff_interval = poll_interval * 4;
    let mut failures: u32 = 0;
    let mut last_state: Option<SessionState> = None;
    let mut last_snippet: Option<String> = None;

    tracing::debug!(%task_id, tmux_session, "session monitor started");

    loop {
        let interval = if failures >= max_capture_failures {
            backoff_interval
        } else {
            poll_interval
        };
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!(%task_id, "session monitor cancelled");
                return;
            }
            _ = tokio::time::sleep(interval) => {}
        }

        // Hook notifications ride the same poll loop
        if let Some(signal) = SignalFile::take(&task_id) {
            let sent = events
                .send(Event::HookSignal {
                    task_id: task_id.clone(),
                    event: signal.event,
                })
                .await;
            if sent.is_err() {
                return;
            }
        }

        match tmux.capture_pane(&tmux_session, capture_lines).await {
            Ok(output) => {
                let was_unhealthy = failures >= max_capture_failures;
                failures = 0;

                let state = detector.classify(&output);
                let snippet = detector.snippet(&output, snippet_lines);
                let changed = was_unhealthy
                    || last_state != Some(state)
                    || last_snippet != snippet;
                if changed {
                    last_state = Some(state);
                    last_snippet = snippet.clone();
                    let sent = events
                        .send(Event::SessionStateChanged {
                            task_id: task_id.clone(),
                            state,
                            output_snippet: snippet,
                        })
                        .await;
                    if sent.is_err() {
                        return;
                    }
                }
            }
            Err(e) => {
                failures += 1;
                tracing::debug!(%task_id, failures, error = %e, "pane capture failed");
                if failures == max_capture_failures {
                    let sent = events
                        .send(Event::SessionMarkedUnknown {
                            task_id: task_id.clone(),
                            reason: format!("capture failed: {}", e),
                        })
                        .await;
                    if sent.is_err() {
                        return;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
