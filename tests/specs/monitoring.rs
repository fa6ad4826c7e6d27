// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Monitor-driven state flow: detection, failure budgets, recovery.

use super::harness::{rig, rig_with};
use az_adapters::{CmdOutput, ScriptedResult};
use az_core::{Command, CommandOutcome, DevServerStatus, SessionState, TaskId};

#[tokio::test]
async fn waiting_prompt_reaches_the_board_and_notifies() {
    let rig = rig();
    rig.start_session("az-1").await;

    rig.runner.on(
        "tmux",
        &["capture-pane"],
        ScriptedResult::Ok(CmdOutput::ok("Do you want to apply this patch? [y/n]")),
    );

    let snapshot = rig
        .wait_for(|s| {
            s.sessions
                .get(&TaskId::new("az-1"))
                .map(|v| v.session.state == SessionState::Waiting)
                .unwrap_or(false)
        })
        .await;
    assert!(snapshot.sessions[&TaskId::new("az-1")]
        .session
        .last_output
        .as_deref()
        .unwrap()
        .contains("[y/n]"));

    // The waiting transition produced a desktop notification
    let notified = tokio::time::timeout(std::time::Duration::from_secs(2), async {
        loop {
            if !rig.notifier.sent().is_empty() {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }
    })
    .await;
    assert!(notified.is_ok());

    rig.handle.shutdown().await;
}

#[tokio::test]
async fn capture_failures_mark_the_session_unknown_then_recover() {
    let rig = rig();
    rig.start_session("az-1").await;

    // Pane capture starts failing
    rig.runner.on(
        "tmux",
        &["capture-pane"],
        ScriptedResult::Ok(CmdOutput::err(1, "can't find pane")),
    );

    let snapshot = rig
        .wait_for(|s| {
            s.sessions
                .get(&TaskId::new("az-1"))
                .map(|v| v.session.state == SessionState::Unknown)
                .unwrap_or(false)
        })
        .await;
    assert!(snapshot.sessions[&TaskId::new("az-1")]
        .session
        .last_error
        .as_deref()
        .unwrap()
        .contains("capture failed"));

    // Captures come back; the monitor transitions the session out of
    // Unknown without needing a restart
    rig.runner.on(
        "tmux",
        &["capture-pane"],
        ScriptedResult::Ok(CmdOutput::ok("compiling...")),
    );
    rig.wait_for(|s| {
        s.sessions
            .get(&TaskId::new("az-1"))
            .map(|v| v.session.state == SessionState::Busy)
            .unwrap_or(false)
    })
    .await;

    rig.handle.shutdown().await;
}

#[tokio::test]
async fn error_output_beats_prompts() {
    let rig = rig();
    rig.start_session("az-1").await;

    rig.runner.on(
        "tmux",
        &["capture-pane"],
        ScriptedResult::Ok(CmdOutput::ok("Error: tests failed\nContinue? [y/n]")),
    );

    rig.wait_for(|s| {
        s.sessions
            .get(&TaskId::new("az-1"))
            .map(|v| v.session.state == SessionState::Error)
            .unwrap_or(false)
    })
    .await;

    rig.handle.shutdown().await;
}

#[tokio::test]
async fn dev_server_status_flows_from_its_monitor() {
    let rig = rig_with(|config, _| {
        config.dev_server.servers = vec![az_core::DevServerDef {
            name: "web".to_string(),
            command: "npm run dev".to_string(),
            ports: vec![az_core::PortDef {
                env_var: "PORT".to_string(),
                default_port: 3000,
            }],
        }];
    });
    rig.start_session("az-1").await;

    // Window listing shows the dev window once started
    rig.runner.on(
        "tmux",
        &["list-windows"],
        ScriptedResult::Ok(CmdOutput::ok("main\ndev-web\n")),
    );

    let outcome = rig
        .send(Command::StartDevServer {
            task_id: TaskId::new("az-1"),
            name: "web".to_string(),
        })
        .await;
    assert_eq!(outcome, CommandOutcome::Ok);

    // Port not serving yet: Starting
    rig.wait_for(|s| {
        s.servers
            .values()
            .any(|v| v.server.status == DevServerStatus::Starting)
    })
    .await;

    // Server binds its port: Running
    rig.probe.set_serving(3000, true);
    rig.wait_for(|s| {
        s.servers
            .values()
            .any(|v| v.server.status == DevServerStatus::Running)
    })
    .await;

    rig.handle.shutdown().await;
}

#[tokio::test]
async fn hook_signals_surface_as_toasts() {
    // Unique task id so parallel tests don't race on the signal file
    let task = format!("az-hook-{}", std::process::id());
    let rig = rig_with(|_, runner| {
        runner.on(
            "bd",
            &["show"],
            ScriptedResult::Ok(CmdOutput::ok(format!(
                r#"{{"id":"{}","title":"Hooked"}}"#,
                task
            ))),
        );
    });
    rig.start_session(&task).await;

    az_core::SignalFile::new("stop", TaskId::new(&task), 1)
        .write()
        .unwrap();

    rig.wait_for(|s| s.toasts.iter().any(|t| t.message.contains("stop")))
        .await;

    rig.handle.shutdown().await;
}
