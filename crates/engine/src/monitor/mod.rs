// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Long-lived watchers over external artefacts.
//!
//! Monitors poll (pane output, TCP ports), classify, and post events to
//! the supervisor's upstream subject. They never touch coordinator state
//! directly.

mod server;
mod session;
mod supervisor;

pub use server::{run_server_monitor, ServerMonitorConfig};
pub use session::{run_session_monitor, SessionMonitorConfig};
pub use supervisor::{MonitorFactory, MonitorKey, MonitorsSupervisor};
