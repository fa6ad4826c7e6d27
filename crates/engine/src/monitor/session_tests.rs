// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::{run_session_monitor, SessionMonitorConfig};
use crate::detector::Detector;
use az_adapters::{CmdOutput, FakeRunner, ScriptedResult, TmuxClient};
use az_core::{Event, SessionState, TaskId};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

fn fast_config(task: &str) -> SessionMonitorConfig {
    SessionMonitorConfig::new(TaskId::new(task), format!("az-{}", task))
        .poll_interval(Duration::from_millis(10))
}

struct Harness {
    runner: FakeRunner,
    events: mpsc::Receiver<Event>,
    cancel: CancellationToken,
    handle: tokio::task::JoinHandle<()>,
}

impl Harness {
    /// Script the runner first, then start the monitor, so the first poll
    /// already sees the intended pane content.
    fn start(config: SessionMonitorConfig, runner: FakeRunner) -> Self {
        let (tx, rx) = mpsc::channel(64);
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_session_monitor(
            config,
            TmuxClient::new(runner.clone()),
            Detector::default(),
            tx,
            cancel.clone(),
        ));
        Self {
            runner,
            events: rx,
            cancel,
            handle,
        }
    }

    async fn next_event(&mut self) -> Event {
        tokio::time::timeout(Duration::from_secs(2), self.events.recv())
            .await
            .expect("timed out waiting for monitor event")
            .expect("monitor channel closed")
    }

    async fn finish(self) {
        self.cancel.cancel();
        self.handle.await.unwrap();
    }
}

fn pane(runner: &FakeRunner, content: &str) {
    runner.on(
        "tmux",
        &["capture-pane"],
        ScriptedResult::Ok(CmdOutput::ok(content)),
    );
}

#[tokio::test]
async fn emits_state_change_on_first_capture() {
    let runner = FakeRunner::new();
    pane(&runner, "Running tests...");
    let mut harness = Harness::start(fast_config("az-m1"), runner);

    match harness.next_event().await {
        Event::SessionStateChanged {
            task_id,
            state,
            output_snippet,
        } => {
            assert_eq!(task_id, "az-m1");
            assert_eq!(state, SessionState::Busy);
            assert_eq!(output_snippet.as_deref(), Some("Running tests..."));
        }
        other => panic!("unexpected event: {other:?}"),
    }

    harness.finish().await;
}

#[tokio::test]
async fn does_not_reemit_unchanged_output() {
    let runner = FakeRunner::new();
    pane(&runner, "steady output");
    let mut harness = Harness::start(fast_config("az-m2"), runner);

    let _first = harness.next_event().await;
    // Several more polls happen; nothing new should arrive
    let quiet = tokio::time::timeout(Duration::from_millis(100), harness.events.recv()).await;
    assert!(quiet.is_err(), "expected no further events, got {quiet:?}");

    harness.finish().await;
}

#[tokio::test]
async fn reemits_when_snippet_changes_within_same_state() {
    let runner = FakeRunner::new();
    pane(&runner, "step one");
    let mut harness = Harness::start(fast_config("az-m3"), runner);
    let _first = harness.next_event().await;

    pane(&harness.runner, "step two");
    match harness.next_event().await {
        Event::SessionStateChanged {
            state,
            output_snippet,
            ..
        } => {
            assert_eq!(state, SessionState::Busy);
            assert_eq!(output_snippet.as_deref(), Some("step two"));
        }
        other => panic!("unexpected event: {other:?}"),
    }

    harness.finish().await;
}

#[tokio::test]
async fn waiting_prompt_is_classified() {
    let runner = FakeRunner::new();
    pane(&runner, "Do you want to continue? [y/n]");
    let mut harness = Harness::start(fast_config("az-m7"), runner);

    assert!(matches!(
        harness.next_event().await,
        Event::SessionStateChanged {
            state: SessionState::Waiting,
            ..
        }
    ));

    harness.finish().await;
}

#[tokio::test]
async fn marks_unknown_after_consecutive_failures_then_recovers() {
    let runner = FakeRunner::new();
    runner.on(
        "tmux",
        &["capture-pane"],
        ScriptedResult::Ok(CmdOutput::err(1, "can't find session")),
    );
    let mut harness = Harness::start(fast_config("az-m4"), runner);

    match harness.next_event().await {
        Event::SessionMarkedUnknown { task_id, reason } => {
            assert_eq!(task_id, "az-m4");
            assert!(reason.contains("capture failed"));
        }
        other => panic!("unexpected event: {other:?}"),
    }

    // Pane comes back: the next successful capture re-emits state
    pane(&harness.runner, "back to work");
    assert!(matches!(
        harness.next_event().await,
        Event::SessionStateChanged {
            state: SessionState::Busy,
            ..
        }
    ));

    harness.finish().await;
}

#[tokio::test]
async fn cancellation_exits_without_final_emission() {
    let runner = FakeRunner::new();
    pane(&runner, "output");
    let mut harness = Harness::start(fast_config("az-m5"), runner);
    let _first = harness.next_event().await;

    harness.cancel.cancel();
    harness.handle.await.unwrap();
    assert!(harness.events.try_recv().is_err());
}

#[tokio::test]
async fn picks_up_notify_signal_files() {
    let task = format!("az-m6-{}", std::process::id());
    let runner = FakeRunner::new();
    pane(&runner, "working");
    let mut harness = Harness::start(fast_config(&task), runner);
    let _first = harness.next_event().await;

    az_core::SignalFile::new("stop", TaskId::new(&task), 1)
        .write()
        .unwrap();

    loop {
        if let Event::HookSignal { task_id, event } = harness.next_event().await {
            assert_eq!(task_id.as_str(), task);
            assert_eq!(event, "stop");
            break;
        }
    }

    harness.finish().await;
}
