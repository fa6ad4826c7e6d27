// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::{Config, GitWorkflowMode};
use std::path::Path;

#[test]
fn defaults_match_documented_values() {
    let config = Config::default();
    assert_eq!(config.worktree.path_template, "../{project}-{bead-id}");
    assert_eq!(config.worktree.init_commands, vec!["direnv allow"]);
    assert!(config.worktree.continue_on_failure);
    assert_eq!(config.session.shell, "zsh");
    assert_eq!(config.session.tmux_prefix, "C-a");
    assert_eq!(config.git.workflow_mode, GitWorkflowMode::Origin);
    assert!(config.git.push_branch_on_create);
    assert_eq!(config.git.base_branch, "main");
    assert_eq!(config.git.remote, "origin");
    assert_eq!(config.git.branch_prefix, "az-");
    assert!(config.pr.enabled);
    assert!(config.pr.auto_draft);
    assert!(!config.pr.auto_merge);
    assert!(config.beads.sync_enabled);
    assert_eq!(config.polling.beads_refresh, 30_000);
    assert_eq!(config.polling.session_monitor, 500);
    assert!(config.theme.is_none());
}

#[test]
fn partial_file_keeps_defaults_elsewhere() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join(super::CONFIG_FILE),
        r#"{"git": {"baseBranch": "develop"}, "theme": "dusk", "unknownKey": 1}"#,
    )
    .unwrap();

    let config = Config::load(dir.path()).unwrap();
    assert_eq!(config.git.base_branch, "develop");
    // untouched sections keep defaults
    assert_eq!(config.git.branch_prefix, "az-");
    assert_eq!(config.session.shell, "zsh");
    assert_eq!(config.theme.as_deref(), Some("dusk"));
}

#[test]
fn missing_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::load(dir.path()).unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn invalid_json_is_a_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(super::CONFIG_FILE), "{not json").unwrap();
    let err = Config::load(dir.path()).unwrap_err();
    assert!(err.to_string().contains("invalid config"));
}

#[test]
fn worktree_path_substitutes_template() {
    let config = Config::default();
    let path = config.worktree_path(Path::new("/home/dev/proj"), "az-1");
    assert_eq!(path, Path::new("/home/dev/proj/../proj-az-1"));
}

#[test]
fn absolute_template_is_used_verbatim() {
    let mut config = Config::default();
    config.worktree.path_template = "/tmp/wt/{bead-id}".to_string();
    let path = config.worktree_path(Path::new("/home/dev/proj"), "az-2");
    assert_eq!(path, Path::new("/tmp/wt/az-2"));
}

#[test]
fn branch_name_uses_prefix() {
    let config = Config::default();
    assert_eq!(config.branch_name("az-7"), "az-az-7");
}

#[test]
fn server_defs_parse_with_ports() {
    let json = r#"{
        "devServer": {
            "servers": [
                {"name": "web", "command": "npm run dev", "ports": [{"envVar": "PORT", "defaultPort": 3000}]}
            ]
        }
    }"#;
    let config: Config = serde_json::from_str(json).unwrap();
    let def = config.server_def("web").unwrap();
    assert_eq!(def.command, "npm run dev");
    assert_eq!(def.ports[0].env_var, "PORT");
    assert_eq!(def.ports[0].default_port, 3000);
    assert!(config.server_def("api").is_none());
}
