// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! az-adapters: typed seams to the external world.
//!
//! Every external process Azedarach talks to — tmux, git, the `bd` issue
//! CLI, `gh`, the clipboard — goes through the [`CommandRunner`] seam so
//! the orchestration engine can be driven entirely by table-driven fakes.

pub mod beads;
pub mod clipboard;
pub mod gh;
pub mod git;
pub mod notify;
pub mod probe;
pub mod runner;
pub mod tmux;

pub use beads::{BeadsClient, BeadsError, DepKind, TaskEdit};
pub use clipboard::{Clipboard, ClipboardError};
pub use gh::{GhClient, GhError, PrRequest};
pub use git::{GitClient, GitError, MergeProbe};
pub use notify::{DesktopNotifier, NoOpNotifier, Notifier, NotifyError};
pub use probe::{PortProbe, TcpPortProbe};
pub use runner::{CmdOutput, CmdSpec, CommandRunner, RunnerError, SystemRunner};
pub use tmux::{attach_argv, TmuxClient, TmuxError};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeNotifier, FakePortProbe, FakeRunner, RecordedCall, ScriptedResult};
