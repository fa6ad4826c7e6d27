// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Clipboard integration via platform copy tools.
//!
//! Used to hand PR URLs to the user on completion. Copy failures are
//! reported but never block a workflow.

use crate::runner::{CmdSpec, CommandRunner};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("no clipboard tool available (tried pbcopy, wl-copy, xclip)")]
    NoTool,
    #[error("clipboard copy failed: {0}")]
    CopyFailed(String),
}

/// Copies text through the first working platform tool.
#[derive(Clone)]
pub struct Clipboard<R> {
    runner: R,
}

impl<R: CommandRunner> Clipboard<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    pub async fn copy(&self, text: &str) -> Result<(), ClipboardError> {
        let candidates: &[(&str, &[&str])] = &[
            ("pbcopy", &[]),
            ("wl-copy", &[]),
            ("xclip", &["-selection", "clipboard"]),
        ];

        for (program, args) in candidates {
            let spec = CmdSpec::new(*program)
                .args(args.to_vec())
                .stdin(text)
                .timeout(Duration::from_secs(5));
            match self.runner.run(spec).await {
                Ok(output) if output.success() => return Ok(()),
                Ok(output) => {
                    return Err(ClipboardError::CopyFailed(
                        output.stderr.trim().to_string(),
                    ))
                }
                // Tool not installed; try the next one
                Err(_) => continue,
            }
        }
        Err(ClipboardError::NoTool)
    }
}

#[cfg(test)]
#[path = "clipboard_tests.rs"]
mod tests;
