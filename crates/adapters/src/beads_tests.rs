// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::{BeadsClient, BeadsError, DepKind, TaskEdit};
use crate::fake::{FakeRunner, ScriptedResult};
use crate::runner::CmdOutput;
use az_core::{IssueType, Priority, TaskId, TaskStatus};

fn client() -> (BeadsClient<FakeRunner>, FakeRunner) {
    let runner = FakeRunner::new();
    (BeadsClient::new(runner.clone(), "/tmp/proj"), runner)
}

#[tokio::test]
async fn list_all_parses_tasks_and_tolerates_extras() {
    let (bd, runner) = client();
    runner.on(
        "bd",
        &["list", "--json"],
        ScriptedResult::Ok(CmdOutput::ok(
            r#"[
                {"id":"az-1","title":"Add login","status":"open","priority":1,"novel":true},
                {"id":"az-2","title":"Fix crash","issue_type":"bug","status":"in_progress"}
            ]"#,
        )),
    );

    let tasks = bd.list_all().await.unwrap();
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0].id, "az-1");
    assert_eq!(tasks[0].priority, Priority::P1);
    assert_eq!(tasks[1].issue_type, IssueType::Bug);

    let call = &runner.calls_for("bd")[0];
    assert_eq!(call.cwd.as_deref(), Some(std::path::Path::new("/tmp/proj")));
}

#[tokio::test]
async fn empty_list_output_is_no_tasks() {
    let (bd, runner) = client();
    runner.on("bd", &["list", "--json"], ScriptedResult::Ok(CmdOutput::ok("")));
    assert!(bd.list_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn show_maps_not_found() {
    let (bd, runner) = client();
    runner.on(
        "bd",
        &["show"],
        ScriptedResult::Ok(CmdOutput::err(1, "error: issue az-99 not found")),
    );
    let err = bd.show(&TaskId::new("az-99")).await.unwrap_err();
    assert!(matches!(err, BeadsError::NotFound(id) if id == "az-99"));
}

#[tokio::test]
async fn malformed_json_is_a_parse_error() {
    let (bd, runner) = client();
    runner.on(
        "bd",
        &["show"],
        ScriptedResult::Ok(CmdOutput::ok("not json")),
    );
    let err = bd.show(&TaskId::new("az-1")).await.unwrap_err();
    assert!(matches!(err, BeadsError::Parse { op: "show", .. }));
}

#[tokio::test]
async fn create_passes_type_priority_and_parent() {
    let (bd, runner) = client();
    runner.on(
        "bd",
        &["create", "--json"],
        ScriptedResult::Ok(CmdOutput::ok(r#"{"id":"az-10","title":"Child task"}"#)),
    );

    let parent = TaskId::new("az-3");
    let task = bd
        .create("Child task", IssueType::Feature, Priority::P1, Some(&parent))
        .await
        .unwrap();
    assert_eq!(task.id, "az-10");
    assert!(runner.saw("create Child task --type feature --priority 1 --json --parent az-3"));
}

#[tokio::test]
async fn update_status_uses_wire_names() {
    let (bd, runner) = client();
    bd.update_status(&TaskId::new("az-1"), TaskStatus::InProgress)
        .await
        .unwrap();
    bd.update_status(&TaskId::new("az-1"), TaskStatus::Review)
        .await
        .unwrap();
    assert!(runner.saw("update az-1 --status in_progress"));
    assert!(runner.saw("update az-1 --status blocked"));
}

#[tokio::test]
async fn update_details_skips_empty_edit() {
    let (bd, runner) = client();
    bd.update_details(&TaskId::new("az-1"), &TaskEdit::default())
        .await
        .unwrap();
    assert!(runner.calls().is_empty());

    bd.update_details(
        &TaskId::new("az-1"),
        &TaskEdit {
            title: Some("New title".into()),
            ..TaskEdit::default()
        },
    )
    .await
    .unwrap();
    assert!(runner.saw("update az-1 --title New title"));
}

#[tokio::test]
async fn close_with_reason() {
    let (bd, runner) = client();
    bd.close(&TaskId::new("az-4"), Some("merged")).await.unwrap();
    assert!(runner.saw("close az-4 --reason merged"));
}

#[tokio::test]
async fn dep_add_names_the_relation() {
    let (bd, runner) = client();
    bd.dep_add(
        &TaskId::new("az-5"),
        &TaskId::new("az-3"),
        DepKind::ParentChild,
    )
    .await
    .unwrap();
    assert!(runner.saw("dep add az-5 az-3 --type parent-child"));
}

#[tokio::test]
async fn sync_in_runs_in_the_given_worktree() {
    let (bd, runner) = client();
    bd.sync_in(std::path::Path::new("/tmp/wt-az-1")).await.unwrap();
    let call = &runner.calls_for("bd")[0];
    assert_eq!(
        call.cwd.as_deref(),
        Some(std::path::Path::new("/tmp/wt-az-1"))
    );
}

#[tokio::test]
async fn invalid_input_is_classified() {
    let (bd, runner) = client();
    runner.on(
        "bd",
        &["create"],
        ScriptedResult::Ok(CmdOutput::err(2, "error: invalid priority: 9")),
    );
    let err = bd
        .create("x", IssueType::Task, Priority::P2, None)
        .await
        .unwrap_err();
    assert!(matches!(err, BeadsError::InvalidInput(_)));
}

#[tokio::test]
async fn epic_with_children_issues_show_then_list() {
    let (bd, runner) = client();
    runner.on(
        "bd",
        &["show"],
        ScriptedResult::Ok(CmdOutput::ok(
            r#"{"id":"az-3","title":"Epic","issue_type":"epic"}"#,
        )),
    );
    runner.on(
        "bd",
        &["list", "--parent"],
        ScriptedResult::Ok(CmdOutput::ok(r#"[{"id":"az-5","title":"Child"}]"#)),
    );

    let (epic, children) = bd.epic_with_children(&TaskId::new("az-3")).await.unwrap();
    assert_eq!(epic.issue_type, IssueType::Epic);
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].parent, None);
}
