// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pane-output classification.
//!
//! The single place session-state classification lives. The detector scans
//! the tail of captured pane text against an ordered pattern table; the
//! priority order between classes is fixed (Error > Done > Waiting > Busy)
//! while the patterns themselves are configurable to track new assistant
//! output formats.

use az_core::SessionState;

/// How many trailing lines of a capture are considered.
const TAIL_LINES: usize = 100;

/// Pattern table for the detector. First match wins within a class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectorConfig {
    pub error_patterns: Vec<String>,
    pub done_patterns: Vec<String>,
    pub waiting_patterns: Vec<String>,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        let owned = |patterns: &[&str]| patterns.iter().map(|p| p.to_string()).collect();
        Self {
            error_patterns: owned(&["Error:", "Exception:", "FAILED", "fatal error", "panic:"]),
            done_patterns: owned(&[
                "Task completed",
                "Successfully completed",
                "All done",
                "✓ completed",
            ]),
            waiting_patterns: owned(&[
                "[y/n]",
                "[Y/n]",
                "[yes/no]",
                "Do you want to",
                "Press Enter",
                "waiting for",
                "Approve?",
            ]),
        }
    }
}

/// Classifies captured pane output into a [`SessionState`].
#[derive(Debug, Clone, Default)]
pub struct Detector {
    config: DetectorConfig,
}

impl Detector {
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }

    /// Classify the tail of a pane capture.
    ///
    /// Priority: Error > Done > Waiting; otherwise any non-empty tail is
    /// `Busy` and an empty one is `Idle`.
    pub fn classify(&self, output: &str) -> SessionState {
        let tail = tail_of(output, TAIL_LINES);

        if matches_any(&tail, &self.config.error_patterns) {
            return SessionState::Error;
        }
        if matches_any(&tail, &self.config.done_patterns) {
            return SessionState::Done;
        }
        if matches_any(&tail, &self.config.waiting_patterns) {
            return SessionState::Waiting;
        }
        if tail.trim().is_empty() {
            SessionState::Idle
        } else {
            SessionState::Busy
        }
    }

    /// A short trimmed snippet of the capture for board previews: the last
    /// few non-blank lines.
    pub fn snippet(&self, output: &str, max_lines: usize) -> Option<String> {
        let lines: Vec<&str> = output
            .lines()
            .map(str::trim_end)
            .filter(|l| !l.trim().is_empty())
            .collect();
        if lines.is_empty() {
            return None;
        }
        let start = lines.len().saturating_sub(max_lines);
        Some(lines[start..].join("\n"))
    }
}

fn tail_of(output: &str, lines: usize) -> String {
    let all: Vec<&str> = output.lines().collect();
    let start = all.len().saturating_sub(lines);
    all[start..].join("\n")
}

fn matches_any(tail: &str, patterns: &[String]) -> bool {
    patterns.iter().any(|p| tail.contains(p.as_str()))
}

#[cfg(test)]
#[path = "detector_tests.rs"]
mod tests;
