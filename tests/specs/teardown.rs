// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Completion and teardown semantics, including failure aggregation.

use super::harness::{rig, rig_with};
use az_adapters::{CmdOutput, ScriptedResult};
use az_core::{Command, CommandOutcome, CompleteMode, TaskId};

#[tokio::test]
async fn complete_closes_issue_and_removes_everything() {
    let rig = rig();
    rig.start_session("az-1").await;

    let outcome = rig
        .send(Command::Complete {
            task_id: TaskId::new("az-1"),
            mode: CompleteMode::CloseOnly,
        })
        .await;
    assert_eq!(outcome, CommandOutcome::Started);

    rig.wait_for(|s| s.sessions.is_empty()).await;
    rig.wait_for_call("close az-1 --reason completed").await;
    rig.wait_for_call("kill-session -t az-az-1").await;
    rig.wait_for_call("worktree remove --force").await;

    rig.handle.shutdown().await;
}

#[tokio::test]
async fn complete_with_pr_pushes_and_copies_the_url() {
    let rig = rig_with(|_, runner| {
        runner.on(
            "gh",
            &["pr", "create"],
            ScriptedResult::Ok(CmdOutput::ok("https://github.com/o/r/pull/5\n")),
        );
    });
    rig.start_session("az-1").await;

    let outcome = rig
        .send(Command::Complete {
            task_id: TaskId::new("az-1"),
            mode: CompleteMode::WithPr,
        })
        .await;
    assert_eq!(outcome, CommandOutcome::Started);

    let snapshot = rig
        .wait_for(|s| s.toasts.iter().any(|t| t.message.contains("pull/5")))
        .await;
    assert!(snapshot.sessions.is_empty());
    rig.wait_for_call("pr create --title az-1: Add login").await;

    rig.handle.shutdown().await;
}

#[tokio::test]
async fn worktree_delete_failure_does_not_stop_the_rest() {
    let rig = rig_with(|_, runner| {
        runner.on(
            "git",
            &["worktree", "remove"],
            ScriptedResult::Ok(CmdOutput::err(1, "worktree locked")),
        );
    });
    rig.start_session("az-5").await;

    let outcome = rig
        .send(Command::Complete {
            task_id: TaskId::new("az-5"),
            mode: CompleteMode::CloseOnly,
        })
        .await;
    assert_eq!(outcome, CommandOutcome::Started);

    // The record goes away, the issue was closed, the session was killed,
    // and the failure is surfaced as an aggregated warning
    let snapshot = rig
        .wait_for(|s| {
            s.toasts
                .iter()
                .any(|t| t.message.contains("teardown of az-5 incomplete"))
        })
        .await;
    assert!(snapshot.sessions.is_empty());
    assert!(snapshot
        .toasts
        .iter()
        .any(|t| t.message.contains("worktree locked")));
    assert!(rig.runner.saw("close az-5"));
    assert!(rig.runner.saw("kill-session -t az-az-5"));

    rig.handle.shutdown().await;
}

#[tokio::test]
async fn delete_tears_down_without_closing_the_issue() {
    let rig = rig();
    rig.start_session("az-1").await;

    let outcome = rig
        .send(Command::Delete {
            task_id: TaskId::new("az-1"),
        })
        .await;
    assert_eq!(outcome, CommandOutcome::Started);

    rig.wait_for(|s| s.sessions.is_empty()).await;
    rig.wait_for_call("kill-session -t az-az-1").await;
    assert!(!rig.runner.saw("close az-1"));

    rig.handle.shutdown().await;
}

#[tokio::test]
async fn dev_servers_are_stopped_and_ports_released_on_teardown() {
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

    let outcome = rig
        .send(Command::StartDevServer {
            task_id: TaskId::new("az-1"),
            name: "web".to_string(),
        })
        .await;
    assert_eq!(outcome, CommandOutcome::Ok);
    rig.wait_for(|s| !s.servers.is_empty()).await;

    let outcome = rig
        .send(Command::Delete {
            task_id: TaskId::new("az-1"),
        })
        .await;
    assert_eq!(outcome, CommandOutcome::Started);

    let snapshot = rig
        .wait_for(|s| s.sessions.is_empty() && s.servers.is_empty())
        .await;
    assert!(snapshot.servers.is_empty());
    rig.wait_for_call("kill-window -t az-az-1:dev-web").await;

    rig.handle.shutdown().await;
}
