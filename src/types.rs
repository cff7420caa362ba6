//! Core types for the task thread sync pipeline.

use crate::error::FailureKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a child task.
///
/// The sheet may carry either the canonical English names or the
/// Japanese labels used by the project sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    NotStarted,
    InProgress,
    Completed,
    OnHold,
    /// A non-empty status the pipeline does not recognize; rendered verbatim.
    #[serde(untagged)]
    Other(String),
}

impl TaskStatus {
    /// Parse a trimmed status cell. Unknown values are kept as `Other`.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        let normalized = trimmed.to_lowercase().replace(['_', ' '], "-");
        match normalized.as_str() {
            "not-started" | "todo" | "未着手" => TaskStatus::NotStarted,
            "in-progress" | "working" | "着手中" => TaskStatus::InProgress,
            "completed" | "done" | "完了" => TaskStatus::Completed,
            "on-hold" | "paused" | "保留" => TaskStatus::OnHold,
            _ => TaskStatus::Other(trimmed.to_string()),
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, TaskStatus::Completed)
    }

    pub fn as_str(&self) -> &str {
        match self {
            TaskStatus::NotStarted => "not-started",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Completed => "completed",
            TaskStatus::OnHold => "on-hold",
            TaskStatus::Other(s) => s,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Presentational tag attached to a valid child by a change detector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Marker {
    Deadline,
    StatusChanged,
    /// Marker names from external detectors that have no glyph.
    #[serde(untagged)]
    Other(String),
}

impl Marker {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "deadline" => Marker::Deadline,
            "statusChanged" => Marker::StatusChanged,
            other => Marker::Other(other.to_string()),
        }
    }
}

/// Canonical keys of the child fields subject to required-field validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskField {
    TaskId,
    Title,
    DueDate,
    Status,
}

impl TaskField {
    /// Fields every child must carry to be considered valid.
    pub const REQUIRED: [TaskField; 4] = [
        TaskField::TaskId,
        TaskField::Title,
        TaskField::DueDate,
        TaskField::Status,
    ];

    /// Canonical key, used as the fallback display label.
    pub fn key(self) -> &'static str {
        match self {
            TaskField::TaskId => "taskId",
            TaskField::Title => "title",
            TaskField::DueDate => "dueDate",
            TaskField::Status => "status",
        }
    }
}

/// One project row as read from the data source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParentRow {
    /// Data row index (0-based, header excluded) used for write-back.
    pub row_index: usize,
    pub project_id: String,
    pub title: String,
    pub owner: String,
    /// `None` means no thread has been created yet.
    pub thread_id: Option<String>,
}

/// One child task row exactly as read from the data source, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawChildRow {
    pub row_index: usize,
    pub project_id: String,
    pub task_id: String,
    pub title: String,
    pub assignee: String,
    pub due_date: String,
    pub status: String,
    pub completed_at: String,
    pub notes: String,
}

impl RawChildRow {
    /// Cell value for a validated field.
    pub fn field(&self, field: TaskField) -> &str {
        match field {
            TaskField::TaskId => &self.task_id,
            TaskField::Title => &self.title,
            TaskField::DueDate => &self.due_date,
            TaskField::Status => &self.status,
        }
    }
}

/// A validated child task with its change markers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildTask {
    pub row_index: usize,
    pub task_id: String,
    pub title: String,
    pub due_date: String,
    pub status: TaskStatus,
    pub assignee: Option<String>,
    pub completed_at: Option<String>,
    pub notes: Option<String>,
    pub markers: Vec<Marker>,
}

impl ChildTask {
    /// Build from a row that has already passed required-field validation.
    pub fn from_valid_row(row: &RawChildRow) -> Self {
        Self {
            row_index: row.row_index,
            task_id: row.task_id.trim().to_string(),
            title: row.title.trim().to_string(),
            due_date: row.due_date.trim().to_string(),
            status: TaskStatus::parse(&row.status),
            assignee: non_empty(&row.assignee),
            completed_at: non_empty(&row.completed_at),
            notes: non_empty(&row.notes),
            markers: Vec::new(),
        }
    }
}

/// A child excluded for missing required fields, kept for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidChild {
    pub task_id: String,
    pub title: String,
    pub reason: String,
}

/// Completion counts over every child of a project, valid or not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionMetrics {
    pub total: usize,
    pub done: usize,
    pub percentage: u8,
    pub updated_at: DateTime<Utc>,
}

impl CompletionMetrics {
    pub fn remaining(&self) -> usize {
        self.total - self.done
    }
}

/// Whether any incomplete child is past its due date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProgressStatus {
    OnSchedule,
    Delayed,
}

impl ProgressStatus {
    pub fn label(self) -> &'static str {
        match self {
            ProgressStatus::OnSchedule => "On schedule",
            ProgressStatus::Delayed => "Delayed",
        }
    }
}

/// Immutable per-cycle view of one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSnapshot {
    pub row_index: usize,
    pub project_id: String,
    pub title: String,
    pub owner: String,
    pub thread_id: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub completion: CompletionMetrics,
    pub progress_status: ProgressStatus,
    pub children: Vec<ChildTask>,
    pub invalid_children: Vec<InvalidChild>,
}

/// Remote identity of a project's thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadIdentity {
    pub thread_id: String,
    pub name: String,
}

/// One failed project in a sync cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectFailure {
    pub project_id: String,
    pub message: String,
    pub kind: FailureKind,
    /// Set when a thread was created but its id is not recorded in the source.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orphaned_thread_id: Option<String>,
}

/// Aggregate outcome of one sync cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResult {
    pub success: usize,
    pub failed: usize,
    pub errors: Vec<ProjectFailure>,
}

impl SyncResult {
    pub fn record_success(&mut self) {
        self.success += 1;
    }

    pub fn record_failure(&mut self, failure: ProjectFailure) {
        self.failed += 1;
        self.errors.push(failure);
    }
}

/// Cursor/limit window over the parent rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageRequest {
    pub cursor: usize,
    /// `None` is unbounded.
    pub limit: Option<usize>,
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
