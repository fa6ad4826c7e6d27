// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared rig: the full application over fake runner, probe, notifier,
//! and clock.

use az_adapters::{CmdOutput, FakeNotifier, FakePortProbe, FakeRunner, ScriptedResult};
use az_core::{BoardSnapshot, Command, CommandOutcome, Config, FakeClock, TaskId};
use az_engine::app::{self, AppHandle};
use std::path::PathBuf;
use std::time::Duration;

pub struct Rig {
    pub handle: AppHandle,
    pub runner: FakeRunner,
    pub probe: FakePortProbe,
    pub notifier: FakeNotifier,
    pub project_root: PathBuf,
    _tmp: tempfile::TempDir,
}

/// Start the app over a temp project with sensible fake defaults:
/// no pre-existing tmux sessions, one known task `az-1`, and init
/// commands that finish instantly.
pub fn rig_with(configure: impl FnOnce(&mut Config, &FakeRunner)) -> Rig {
    let tmp = tempfile::tempdir().unwrap();
    let project_root = tmp.path().join("proj");
    std::fs::create_dir_all(&project_root).unwrap();

    let mut config = Config::default();
    config.worktree.path_template = "wt-{bead-id}".to_string();
    config.worktree.init_commands = vec!["echo ready".to_string()];
    config.polling.session_monitor = 10;
    config.polling.beads_refresh = 120_000;

    let runner = FakeRunner::new();
    runner.on(
        "tmux",
        &["has-session"],
        ScriptedResult::Ok(CmdOutput::err(1, "can't find session")),
    );
    runner.on(
        "bd",
        &["show"],
        ScriptedResult::Ok(CmdOutput::ok(
            r#"{"id":"az-1","title":"Add login","description":"OAuth flow"}"#,
        )),
    );
    runner.on(
        "bd",
        &["list", "--json"],
        ScriptedResult::Ok(CmdOutput::ok(r#"[{"id":"az-1","title":"Add login"}]"#)),
    );
    runner.on(
        "tmux",
        &["capture-pane"],
        ScriptedResult::Ok(CmdOutput::ok("__AZ_RC_0_0__\n")),
    );

    configure(&mut config, &runner);

    let probe = FakePortProbe::new();
    let notifier = FakeNotifier::new();
    let handle = app::start(
        runner.clone(),
        probe.clone(),
        notifier.clone(),
        FakeClock::new(),
        config,
        project_root.clone(),
    )
    .unwrap();

    Rig {
        handle,
        runner,
        probe,
        notifier,
        project_root,
        _tmp: tmp,
    }
}

pub fn rig() -> Rig {
    rig_with(|_, _| {})
}

impl Rig {
    pub async fn send(&self, command: Command) -> CommandOutcome {
        self.handle.ctx.commands.send(command).await.unwrap()
    }

    pub async fn start_session(&self, task: &str) {
        let outcome = self
            .send(Command::StartSession {
                task_id: TaskId::new(task),
                initial_prompt: None,
            })
            .await;
        assert_eq!(outcome, CommandOutcome::Started);
        self.wait_for(|s| s.sessions.contains_key(&TaskId::new(task)))
            .await;
    }

    /// Wait (up to 5 s) for a snapshot satisfying the predicate.
    pub async fn wait_for(
        &self,
        mut predicate: impl FnMut(&BoardSnapshot) -> bool,
    ) -> BoardSnapshot {
        let mut rx = self.handle.ctx.snapshots.clone();
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                {
                    let snapshot = rx.borrow();
                    if predicate(&snapshot) {
                        return snapshot.clone();
                    }
                }
                rx.changed().await.expect("snapshot channel closed");
            }
        })
        .await
        .expect("snapshot predicate never satisfied")
    }

    /// Wait (up to 2 s) until a command line fragment was issued.
    pub async fn wait_for_call(&self, fragment: &str) {
        let result = tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                if self.runner.saw(fragment) {
                    return;
                }
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
        })
        .await;
        assert!(result.is_ok(), "never saw command fragment: {fragment}");
    }
}
