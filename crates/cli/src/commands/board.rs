// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use anyhow::{Context, Result};
use az_adapters::{DesktopNotifier, SystemRunner, TcpPortProbe};
use az_core::{Config, SystemClock, ToastSeverity};
use std::path::PathBuf;

/// Board mode: run the full orchestration stack and stream snapshot
/// summaries to stdout until Ctrl-C.
///
/// This is the surface a richer Kanban UI consumes; the stream below is
/// its plain-text stand-in.
pub async fn run(project_root: PathBuf) -> Result<()> {
    let config = Config::load(&project_root).context("loading .azedarach.json")?;
    let handle = az_engine::start(
        SystemRunner::new(),
        TcpPortProbe::new(),
        DesktopNotifier::new(),
        SystemClock,
        config,
        project_root.clone(),
    )?;

    println!("azedarach board over {}", project_root.display());
    println!("press Ctrl-C to stop");

    let mut snapshots = handle.ctx.snapshots.clone();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow().clone();
                for toast in &snapshot.toasts {
                    let tag = match toast.severity {
                        ToastSeverity::Info => "info",
                        ToastSeverity::Warning => "warn",
                        ToastSeverity::Error => "error",
                    };
                    println!("[{}] {}", tag, toast.message);
                }
                for view in snapshot.sessions_sorted() {
                    println!(
                        "  {} {}  {}",
                        view.session.state.glyph(),
                        view.session.task_id,
                        view.session.state
                    );
                }
            }
        }
    }

    println!("shutting down...");
    handle.shutdown().await;
    Ok(())
}
