// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Recovery-from-scan: rebuilding board state from live tmux sessions.

use az_adapters::{
    CmdOutput, FakeNotifier, FakePortProbe, FakeRunner, ScriptedResult,
};
use az_core::{
    BoardSnapshot, Config, DevServerStatus, FakeClock, ServerKey, SessionState, TaskId,
};
use az_engine::app;
use std::path::Path;
use std::time::Duration;

/// Fake external world: one known task whose tmux session (with a dev
/// window) is already alive.
fn scripted_world(runner: &FakeRunner) {
    runner.on(
        "bd",
        &["list", "--json"],
        ScriptedResult::Ok(CmdOutput::ok(
            r#"[{"id":"az-1","title":"Add login"},{"id":"az-2","title":"Untouched"}]"#,
        )),
    );
    runner.on(
        "tmux",
        &["list-sessions"],
        ScriptedResult::Ok(CmdOutput::ok("az-az-1\nsomeone-elses-session\n")),
    );
    runner.on(
        "tmux",
        &["list-windows", "-t", "az-az-1"],
        ScriptedResult::Ok(CmdOutput::ok("main\ndev-web\n")),
    );
    runner.on(
        "tmux",
        &["show-environment", "-t", "az-az-1", "WEB_PORT"],
        ScriptedResult::Ok(CmdOutput::ok("WEB_PORT=3007\n")),
    );
}

fn config() -> Config {
    let mut config = Config::default();
    config.worktree.path_template = "wt-{bead-id}".to_string();
    config.polling.beads_refresh = 120_000;
    config.dev_server.servers = vec![az_core::DevServerDef {
        name: "web".to_string(),
        command: "npm run dev".to_string(),
        ports: vec![az_core::PortDef {
            env_var: "WEB_PORT".to_string(),
            default_port: 3000,
        }],
    }];
    config
}

async fn boot(runner: &FakeRunner, project_root: &Path) -> (app::AppHandle, BoardSnapshot) {
    let handle = app::start(
        runner.clone(),
        FakePortProbe::new(),
        FakeNotifier::new(),
        FakeClock::new(),
        config(),
        project_root.to_path_buf(),
    )
    .unwrap();

    // The recovery pass publishes before the loop starts consuming
    let mut rx = handle.ctx.snapshots.clone();
    let snapshot = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            {
                let snapshot = rx.borrow();
                if snapshot.version >= 1 {
                    return snapshot.clone();
                }
            }
            rx.changed().await.expect("snapshot channel closed");
        }
    })
    .await
    .expect("no initial snapshot");
    (handle, snapshot)
}

#[tokio::test]
async fn boot_rebuilds_sessions_and_servers_from_the_scan() {
    let tmp = tempfile::tempdir().unwrap();
    let project_root = tmp.path().join("proj");
    std::fs::create_dir_all(&project_root).unwrap();

    let runner = FakeRunner::new();
    scripted_world(&runner);

    let (handle, snapshot) = boot(&runner, &project_root).await;

    // az-1's live session came back; az-2 and foreign sessions did not
    assert_eq!(snapshot.sessions.len(), 1);
    let view = &snapshot.sessions[&TaskId::new("az-1")];
    assert_eq!(view.session.tmux_session, "az-az-1");
    assert_eq!(view.session.state, SessionState::Unknown);

    // The dev window was recognized and its port reservation rebuilt
    let key = ServerKey::new("az-1", "web");
    let server = &snapshot.servers[&key];
    assert_eq!(server.server.port, Some(3007));
    assert_eq!(server.server.status, DevServerStatus::Unknown);

    handle.shutdown().await;
}

#[tokio::test]
async fn recovery_is_idempotent_across_restarts() {
    let tmp = tempfile::tempdir().unwrap();
    let project_root = tmp.path().join("proj");
    std::fs::create_dir_all(&project_root).unwrap();

    let runner = FakeRunner::new();
    scripted_world(&runner);

    let (first_handle, first) = boot(&runner, &project_root).await;
    first_handle.shutdown().await;

    let (second_handle, second) = boot(&runner, &project_root).await;
    second_handle.shutdown().await;

    // Same external state, same rebuilt board (timestamps vary by clock,
    // versions by publication count)
    let first_sessions: Vec<_> = first
        .sessions
        .iter()
        .map(|(id, v)| (id.clone(), v.session.tmux_session.clone(), v.session.state))
        .collect();
    let second_sessions: Vec<_> = second
        .sessions
        .iter()
        .map(|(id, v)| (id.clone(), v.session.tmux_session.clone(), v.session.state))
        .collect();
    similar_asserts::assert_eq!(first_sessions, second_sessions);

    let first_servers: Vec<_> = first
        .servers
        .iter()
        .map(|(k, v)| (k.clone(), v.server.port, v.server.status))
        .collect();
    let second_servers: Vec<_> = second
        .servers
        .iter()
        .map(|(k, v)| (k.clone(), v.server.port, v.server.status))
        .collect();
    similar_asserts::assert_eq!(first_servers, second_servers);
}

#[tokio::test]
async fn recovered_sessions_resume_monitoring() {
    let tmp = tempfile::tempdir().unwrap();
    let project_root = tmp.path().join("proj");
    std::fs::create_dir_all(&project_root).unwrap();

    let runner = FakeRunner::new();
    scripted_world(&runner);
    runner.on(
        "tmux",
        &["capture-pane"],
        ScriptedResult::Ok(CmdOutput::ok("Running tests...")),
    );

    let (handle, _snapshot) = boot(&runner, &project_root).await;

    // The restarted monitor pulls the session out of Unknown
    let mut rx = handle.ctx.snapshots.clone();
    let busy = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            {
                let snapshot = rx.borrow();
                if snapshot
                    .sessions
                    .get(&TaskId::new("az-1"))
                    .map(|v| v.session.state == SessionState::Busy)
                    .unwrap_or(false)
                {
                    return;
                }
            }
            rx.changed().await.expect("snapshot channel closed");
        }
    })
    .await;
    assert!(busy.is_ok());

    handle.shutdown().await;
}
