// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Human-readable rendering for one-shot commands.

use az_core::SessionState;

pub struct StatusRow {
    pub task_id: String,
    pub state: SessionState,
    pub title: String,
    pub session: String,
    pub snippet: String,
}

/// Render the `az status` table, sessions needing attention first.
pub fn render_status(rows: &[StatusRow], verbose: bool) -> String {
    let mut rows: Vec<&StatusRow> = rows.iter().collect();
    rows.sort_by_key(|r| r.state.sort_rank());

    let id_width = rows
        .iter()
        .map(|r| r.task_id.len())
        .max()
        .unwrap_or(4)
        .max(4);
    let state_width = rows
        .iter()
        .map(|r| r.state.to_string().len())
        .max()
        .unwrap_or(5)
        .max(5);

    let mut out = String::new();
    for row in rows {
        out.push_str(&format!(
            "{} {:id_width$}  {:state_width$}  {}\n",
            row.state.glyph(),
            row.task_id,
            row.state.to_string(),
            row.title,
        ));
        if verbose {
            out.push_str(&format!("  [{}] {}\n", row.session, row.snippet));
        }
    }
    out
}

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;
