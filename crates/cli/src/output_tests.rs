// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::{render_status, StatusRow};
use az_core::SessionState;

fn row(task: &str, state: SessionState) -> StatusRow {
    StatusRow {
        task_id: task.to_string(),
        state,
        title: format!("title of {}", task),
        session: format!("az-{}", task),
        snippet: "last line".to_string(),
    }
}

#[test]
fn waiting_sessions_render_first() {
    let rows = vec![
        row("az-1", SessionState::Idle),
        row("az-2", SessionState::Waiting),
    ];
    let rendered = render_status(&rows, false);
    let first = rendered.lines().next().unwrap();
    assert!(first.contains("az-2"));
    assert!(first.contains("waiting"));
}

#[test]
fn verbose_appends_session_and_snippet() {
    let rows = vec![row("az-1", SessionState::Busy)];
    let rendered = render_status(&rows, true);
    assert!(rendered.contains("[az-az-1] last line"));

    let plain = render_status(&rows, false);
    assert!(!plain.contains("last line"));
}
