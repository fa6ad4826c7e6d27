// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cached projection of issue-tool tasks ("beads").
//!
//! Tasks are owned by the external `bd` CLI; this model is what its
//! `--json` output normalizes into. Parsers must tolerate unknown fields,
//! so every struct here derives `Deserialize` without `deny_unknown_fields`.

use serde::{Deserialize, Serialize};
use std::fmt;

crate::define_id! {
    /// Identifier of a task in the external issue tool.
    ///
    /// Globally unique within a project and stable for the lifetime of the
    /// task's git branch. The format (e.g. `az-12`) is opaque to the core.
    pub struct TaskId;
}

/// Issue classification as reported by the issue tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum IssueType {
    #[default]
    Task,
    Bug,
    Feature,
    Epic,
    Chore,
}

impl IssueType {
    /// Type token the issue CLI accepts on create.
    pub fn wire_name(self) -> &'static str {
        match self {
            IssueType::Task => "task",
            IssueType::Bug => "bug",
            IssueType::Feature => "feature",
            IssueType::Epic => "epic",
            IssueType::Chore => "chore",
        }
    }
}

/// Workflow status of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Not yet started (issue tool calls this `open`)
    #[default]
    #[serde(alias = "open")]
    Backlog,
    #[serde(alias = "in-progress")]
    InProgress,
    /// In review or blocked on another task
    #[serde(alias = "blocked")]
    Review,
    #[serde(alias = "closed")]
    Done,
}

impl TaskStatus {
    /// Column position on the board, left to right.
    pub fn column(self) -> usize {
        match self {
            TaskStatus::Backlog => 0,
            TaskStatus::InProgress => 1,
            TaskStatus::Review => 2,
            TaskStatus::Done => 3,
        }
    }

    /// Status token the issue CLI accepts on update.
    pub fn wire_name(self) -> &'static str {
        match self {
            TaskStatus::Backlog => "open",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Review => "blocked",
            TaskStatus::Done => "done",
        }
    }
}

/// Task priority, P0 (most urgent) through P4.
///
/// The issue tool emits priorities as bare numbers (`"priority": 2`); older
/// exports use `"P2"` strings. Both forms are accepted; serialization uses
/// the numeric form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Priority {
    P0,
    P1,
    #[default]
    P2,
    P3,
    P4,
}

impl Priority {
    pub fn level(self) -> u8 {
        match self {
            Priority::P0 => 0,
            Priority::P1 => 1,
            Priority::P2 => 2,
            Priority::P3 => 3,
            Priority::P4 => 4,
        }
    }

    fn from_level(level: u64) -> Option<Self> {
        match level {
            0 => Some(Priority::P0),
            1 => Some(Priority::P1),
            2 => Some(Priority::P2),
            3 => Some(Priority::P3),
            4 => Some(Priority::P4),
            _ => None,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.level())
    }
}

impl Serialize for Priority {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.level())
    }
}

impl<'de> Deserialize<'de> for Priority {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PriorityVisitor;

        impl serde::de::Visitor<'_> for PriorityVisitor {
            type Value = Priority;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a priority number 0-4 or a string like \"P2\"")
            }

            fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<Priority, E> {
                Priority::from_level(v)
                    .ok_or_else(|| E::custom(format!("priority out of range: {}", v)))
            }

            fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<Priority, E> {
                u64::try_from(v)
                    .ok()
                    .and_then(Priority::from_level)
                    .ok_or_else(|| E::custom(format!("priority out of range: {}", v)))
            }

            fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<Priority, E> {
                let digits = v.trim_start_matches(['P', 'p']);
                digits
                    .parse::<u64>()
                    .ok()
                    .and_then(Priority::from_level)
                    .ok_or_else(|| E::custom(format!("unrecognized priority: {}", v)))
            }
        }

        deserializer.deserialize_any(PriorityVisitor)
    }
}

/// A unit of work tracked by the issue tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Free-form design notes attached to the issue
    #[serde(default)]
    pub design: String,
    #[serde(default, rename = "issue_type", alias = "type")]
    pub issue_type: IssueType,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: Priority,
    /// Parent epic, when this task is an epic child
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<TaskId>,
    /// RFC 3339 creation timestamp as emitted by the issue tool
    #[serde(default, rename = "created_at")]
    pub created_at: String,
    #[serde(default, rename = "updated_at")]
    pub updated_at: String,
    /// Attachment file names stored alongside the issue
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<String>,
}

impl Task {
    /// Whether the task is still actionable (not done).
    pub fn is_open(&self) -> bool {
        self.status != TaskStatus::Done
    }
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
