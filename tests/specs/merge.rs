// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The update-from-base protocol, end to end over fakes.

use super::harness::rig_with;
use az_adapters::{CmdOutput, FakeRunner, ScriptedResult};
use az_core::{Command, CommandOutcome, GitWorkflowMode, TaskId};

/// Script a branch that is `behind` commits behind and 1 ahead of `main`.
fn script_counts(runner: &FakeRunner, behind: u64) {
    runner.on(
        "git",
        &["rev-list", "--count", "HEAD..main"],
        ScriptedResult::Ok(CmdOutput::ok(format!("{}\n", behind))),
    );
    runner.on(
        "git",
        &["rev-list", "--count", "main..HEAD"],
        ScriptedResult::Ok(CmdOutput::ok("1\n")),
    );
}

fn conflict_probe(runner: &FakeRunner, paths: &str) {
    runner.on(
        "git",
        &["merge-tree"],
        ScriptedResult::Ok(CmdOutput {
            stdout: format!("0123abcd\n{}", paths),
            stderr: String::new(),
            exit_code: 1,
        }),
    );
    runner.on(
        "git",
        &["merge", "main"],
        ScriptedResult::Ok(CmdOutput::err(1, "Automatic merge failed")),
    );
}

fn local_mode() -> super::harness::Rig {
    rig_with(|config, _| {
        config.git.workflow_mode = GitWorkflowMode::Local;
    })
}

#[tokio::test]
async fn behind_branch_with_conflicts_spawns_the_merge_window() {
    let rig = local_mode();
    rig.start_session("az-1").await;
    script_counts(&rig.runner, 3);
    conflict_probe(&rig.runner, "src/login.ts\n");

    let outcome = rig
        .send(Command::UpdateFromBase {
            task_id: TaskId::new("az-1"),
        })
        .await;
    assert_eq!(
        outcome,
        CommandOutcome::ConflictsDetected {
            files: vec!["src/login.ts".to_string()]
        }
    );

    // A real merge was started and the assistant got its own window
    rig.wait_for_call("merge main").await;
    rig.wait_for_call("new-window -d -t az-az-1 -n merge").await;
    rig.wait_for(|s| s.toasts.iter().any(|t| t.message.contains("src/login.ts")))
        .await;

    rig.handle.shutdown().await;
}

#[tokio::test]
async fn beads_conflicts_are_invisible_to_the_protocol() {
    let rig = local_mode();
    rig.start_session("az-1").await;
    script_counts(&rig.runner, 2);
    conflict_probe(&rig.runner, ".beads/issues.jsonl\nsrc/login.ts\n");

    let outcome = rig
        .send(Command::UpdateFromBase {
            task_id: TaskId::new("az-1"),
        })
        .await;
    // Only the real conflict remains after filtering
    assert_eq!(
        outcome,
        CommandOutcome::ConflictsDetected {
            files: vec!["src/login.ts".to_string()]
        }
    );

    rig.handle.shutdown().await;
}

#[tokio::test]
async fn beads_only_conflicts_merge_cleanly() {
    let rig = local_mode();
    rig.start_session("az-1").await;
    script_counts(&rig.runner, 2);
    rig.runner.on(
        "git",
        &["merge-tree"],
        ScriptedResult::Ok(CmdOutput {
            stdout: "0123abcd\n.beads/issues.jsonl\n".to_string(),
            stderr: String::new(),
            exit_code: 1,
        }),
    );

    let outcome = rig
        .send(Command::UpdateFromBase {
            task_id: TaskId::new("az-1"),
        })
        .await;
    assert_eq!(outcome, CommandOutcome::CleanMerge);
    rig.wait_for_call("merge --no-edit main").await;

    rig.handle.shutdown().await;
}

#[tokio::test]
async fn up_to_date_branch_is_left_alone() {
    let rig = local_mode();
    rig.start_session("az-1").await;
    script_counts(&rig.runner, 0);

    let outcome = rig
        .send(Command::UpdateFromBase {
            task_id: TaskId::new("az-1"),
        })
        .await;
    assert_eq!(outcome, CommandOutcome::AlreadyUpToDate);
    assert!(!rig.runner.saw("merge-tree"));

    rig.handle.shutdown().await;
}

#[tokio::test]
async fn attach_is_refused_while_behind() {
    let rig = local_mode();
    rig.start_session("az-1").await;
    script_counts(&rig.runner, 3);
    // attach_check needs the session to exist
    rig.runner.on(
        "tmux",
        &["has-session"],
        ScriptedResult::Ok(CmdOutput::ok("")),
    );

    let outcome = rig
        .send(Command::Attach {
            task_id: TaskId::new("az-1"),
        })
        .await;
    assert_eq!(outcome, CommandOutcome::BranchBehind { behind: 3 });

    rig.handle.shutdown().await;
}
