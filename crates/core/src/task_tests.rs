// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::{IssueType, Priority, Task, TaskStatus};

#[test]
fn parses_bd_show_output_with_unknown_fields() {
    let json = r#"{
        "id": "az-12",
        "title": "Add login",
        "description": "OAuth flow",
        "issue_type": "feature",
        "status": "in_progress",
        "priority": 1,
        "created_at": "2026-01-10T08:00:00Z",
        "updated_at": "2026-01-11T09:30:00Z",
        "lead": "someone",
        "estimate": 5
    }"#;

    let task: Task = serde_json::from_str(json).unwrap();
    assert_eq!(task.id, "az-12");
    assert_eq!(task.issue_type, IssueType::Feature);
    assert_eq!(task.status, TaskStatus::InProgress);
    assert_eq!(task.priority, Priority::P1);
    assert!(task.parent.is_none());
}

#[test]
fn minimal_task_fills_defaults() {
    let task: Task = serde_json::from_str(r#"{"id": "az-1", "title": "x"}"#).unwrap();
    assert_eq!(task.status, TaskStatus::Backlog);
    assert_eq!(task.priority, Priority::P2);
    assert_eq!(task.issue_type, IssueType::Task);
    assert!(task.is_open());
    assert!(task.attachments.is_empty());
}

#[yare::parameterized(
    open_alias    = { r#""open""#, TaskStatus::Backlog },
    blocked_alias = { r#""blocked""#, TaskStatus::Review },
    closed_alias  = { r#""closed""#, TaskStatus::Done },
    in_progress   = { r#""in_progress""#, TaskStatus::InProgress },
)]
fn status_aliases(json: &str, expected: TaskStatus) {
    let status: TaskStatus = serde_json::from_str(json).unwrap();
    assert_eq!(status, expected);
}

#[test]
fn priority_orders_p0_first() {
    assert!(Priority::P0 < Priority::P1);
    assert!(Priority::P1 < Priority::P4);
}

#[yare::parameterized(
    number       = { "0", Priority::P0 },
    string_upper = { r#""P3""#, Priority::P3 },
    string_lower = { r#""p4""#, Priority::P4 },
    bare_digit   = { r#""1""#, Priority::P1 },
)]
fn priority_accepts_both_wire_forms(json: &str, expected: Priority) {
    let p: Priority = serde_json::from_str(json).unwrap();
    assert_eq!(p, expected);
}

#[test]
fn priority_serializes_numeric() {
    assert_eq!(serde_json::to_string(&Priority::P1).unwrap(), "1");
}

#[test]
fn done_task_is_not_open() {
    let task: Task =
        serde_json::from_str(r#"{"id": "az-2", "title": "x", "status": "done"}"#).unwrap();
    assert!(!task.is_open());
}

#[test]
fn board_columns_are_ordered() {
    assert_eq!(TaskStatus::Backlog.column(), 0);
    assert_eq!(TaskStatus::Done.column(), 3);
}
