// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Happy-path session activation and its serialization guarantees.

use super::harness::{rig, rig_with};
use az_adapters::{CmdOutput, ScriptedResult};
use az_core::{Command, CommandOutcome, SessionState, TaskId};

#[tokio::test]
async fn start_session_creates_worktree_session_and_goes_busy() {
    let rig = rig();

    rig.start_session("az-1").await;

    // Worktree on branch az-az-1 off main, session named after the branch
    rig.wait_for_call("worktree add -b az-az-1").await;
    rig.wait_for_call("new-session -d -s az-az-1").await;
    // The configured init command ran in the main window
    rig.wait_for_call("-l -- echo ready").await;

    // Within a couple of poll intervals the monitor reports Busy
    let snapshot = rig
        .wait_for(|s| {
            s.sessions
                .get(&TaskId::new("az-1"))
                .map(|v| v.session.state == SessionState::Busy)
                .unwrap_or(false)
        })
        .await;
    let view = &snapshot.sessions[&TaskId::new("az-1")];
    assert_eq!(view.session.branch, "az-az-1");
    assert_eq!(view.session.tmux_session, "az-az-1");
    assert!(view
        .session
        .worktree
        .ends_with("wt-az-1"));

    rig.handle.shutdown().await;
}

#[tokio::test]
async fn concurrent_starts_converge_to_one_session() {
    let rig = rig();

    // Fire two activations back to back; the coordinator serializes them
    let first = rig.send(Command::StartSession {
        task_id: TaskId::new("az-1"),
        initial_prompt: None,
    });
    let second = rig.send(Command::StartSession {
        task_id: TaskId::new("az-1"),
        initial_prompt: None,
    });
    let (first, second) = tokio::join!(first, second);

    let accepted = [&first, &second]
        .iter()
        .filter(|o| matches!(o, CommandOutcome::Started))
        .count();
    let rejected = [&first, &second]
        .iter()
        .filter(|o| matches!(o, CommandOutcome::Failed { .. }))
        .count();
    assert_eq!(accepted, 1, "exactly one start may win: {first:?} / {second:?}");
    assert_eq!(rejected, 1);

    let snapshot = rig
        .wait_for(|s| s.sessions.contains_key(&TaskId::new("az-1")))
        .await;
    assert_eq!(snapshot.sessions.len(), 1);

    rig.handle.shutdown().await;
}

#[tokio::test]
async fn snapshot_after_ack_reflects_the_command() {
    let rig = rig();
    rig.start_session("az-1").await;

    // Pause is acked only after its effect is applied; the very next
    // snapshot read must already show it
    let outcome = rig
        .send(Command::Pause {
            task_id: TaskId::new("az-1"),
        })
        .await;
    assert_eq!(outcome, CommandOutcome::Ok);

    let snapshot = rig.handle.ctx.snapshots.borrow().clone();
    assert_eq!(
        snapshot.sessions[&TaskId::new("az-1")].session.state,
        SessionState::Paused
    );

    rig.handle.shutdown().await;
}

#[tokio::test]
async fn initial_prompt_reaches_the_assistant_escaped() {
    let rig = rig_with(|_, _| {});

    let outcome = rig
        .send(Command::StartSession {
            task_id: TaskId::new("az-1"),
            initial_prompt: Some("mind the $PATH".to_string()),
        })
        .await;
    assert_eq!(outcome, CommandOutcome::Started);

    rig.wait_for_call(r#"claude "mind the \$PATH""#).await;
    rig.handle.shutdown().await;
}

#[tokio::test]
async fn start_for_unknown_task_surfaces_not_found() {
    let rig = rig();
    rig.runner.on(
        "bd",
        &["show"],
        ScriptedResult::Ok(CmdOutput::err(1, "issue az-77 not found")),
    );

    let outcome = rig
        .send(Command::StartSession {
            task_id: TaskId::new("az-77"),
            initial_prompt: None,
        })
        .await;
    assert_eq!(outcome, CommandOutcome::Started);

    let snapshot = rig
        .wait_for(|s| s.toasts.iter().any(|t| t.message.contains("az-77")))
        .await;
    assert!(snapshot
        .toasts
        .iter()
        .any(|t| t.message.contains("not found")));

    rig.handle.shutdown().await;
}
