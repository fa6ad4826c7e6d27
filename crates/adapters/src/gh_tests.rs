// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::{GhClient, GhError, PrRequest};
use crate::fake::{FakeRunner, ScriptedResult};
use crate::runner::CmdOutput;

fn request() -> PrRequest {
    PrRequest {
        title: "az-1: Add login".into(),
        body: "Closes az-1".into(),
        base: "main".into(),
        draft: true,
    }
}

#[tokio::test]
async fn create_pr_returns_trimmed_url() {
    let runner = FakeRunner::new();
    runner.on(
        "gh",
        &["pr", "create"],
        ScriptedResult::Ok(CmdOutput::ok("https://github.com/o/r/pull/7\n")),
    );
    let gh = GhClient::new(runner.clone(), "/tmp/wt");

    let url = gh.create_pr(&request()).await.unwrap();
    assert_eq!(url, "https://github.com/o/r/pull/7");
    assert!(runner.saw("--base main"));
    assert!(runner.saw("--draft"));
}

#[tokio::test]
async fn non_draft_omits_flag() {
    let runner = FakeRunner::new();
    let gh = GhClient::new(runner.clone(), "/tmp/wt");
    let mut req = request();
    req.draft = false;
    let _ = gh.create_pr(&req).await;
    assert!(!runner.saw("--draft"));
}

#[tokio::test]
async fn failure_carries_stderr() {
    let runner = FakeRunner::new();
    runner.on(
        "gh",
        &["pr", "create"],
        ScriptedResult::Ok(CmdOutput::err(1, "no commits between main and branch")),
    );
    let gh = GhClient::new(runner, "/tmp/wt");
    let err = gh.create_pr(&request()).await.unwrap_err();
    assert!(matches!(err, GhError::Tool { op: "pr-create", .. }));
    assert!(err.to_string().contains("no commits"));
}
