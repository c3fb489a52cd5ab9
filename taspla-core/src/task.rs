//! Task model shared by the engine, the store seam and the CLI.
//!
//! Field names serialize in snake_case and enum values in lowercase, which is
//! what the task service speaks on the wire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, TaskError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Active,
    Completed,
}

/// Ordered most urgent first, so `Critical < High < Medium < Low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Critical = 0,
    High = 1,
    Medium = 2,
    Low = 3,
}

impl Priority {
    pub const ALL: [Priority; 4] = [
        Priority::Critical,
        Priority::High,
        Priority::Medium,
        Priority::Low,
    ];

    /// 0 for Critical through 3 for Low.
    pub fn rank(self) -> u8 {
        self as u8
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Critical => "critical",
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = TaskError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "critical" | "c" => Ok(Priority::Critical),
            "high" | "h" => Ok(Priority::High),
            "medium" | "m" => Ok(Priority::Medium),
            "low" | "l" => Ok(Priority::Low),
            other => Err(TaskError::InvalidTaskData(format!("unknown priority: {other}"))),
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TaskStatus::Active => "active",
            TaskStatus::Completed => "completed",
        })
    }
}

impl FromStr for TaskStatus {
    type Err = TaskError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(TaskStatus::Active),
            "completed" | "done" => Ok(TaskStatus::Completed),
            other => Err(TaskError::InvalidTaskData(format!("unknown status: {other}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub priority: Priority,

    /// Due timestamp (UTC). Only its local calendar date matters for overdue checks.
    pub due: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminder_days: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminder_hours: Option<u32>,

    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,

    /// Present iff `status == Completed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Build a fresh Active task from a draft.
    pub fn new(id: impl Into<String>, draft: TaskDraft, created_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            title: draft.title,
            description: draft.description,
            priority: draft.priority,
            due: draft.due,
            reminder_days: draft.reminder_days,
            reminder_hours: draft.reminder_hours,
            status: TaskStatus::Active,
            created_at,
            completed_at: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == TaskStatus::Active
    }

    /// A zero offset counts as unset.
    pub fn has_reminder(&self) -> bool {
        self.reminder_days.unwrap_or(0) > 0 || self.reminder_hours.unwrap_or(0) > 0
    }

    /// `completed_at` is present exactly when the task is Completed.
    pub fn is_consistent(&self) -> bool {
        (self.status == TaskStatus::Completed) == self.completed_at.is_some()
    }

    pub(crate) fn apply_draft(&mut self, draft: TaskDraft) {
        self.title = draft.title;
        self.description = draft.description;
        self.priority = draft.priority;
        self.due = draft.due;
        self.reminder_days = draft.reminder_days;
        self.reminder_hours = draft.reminder_hours;
    }

    pub(crate) fn apply_patch(&mut self, patch: TaskPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(due) = patch.due {
            self.due = due;
        }
        if let Some(days) = patch.reminder_days {
            self.reminder_days = days;
        }
        if let Some(hours) = patch.reminder_hours {
            self.reminder_hours = hours;
        }
    }
}

/// The mutable fields of a task, as supplied on create and full update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub due: DateTime<Utc>,
    pub reminder_days: Option<u32>,
    pub reminder_hours: Option<u32>,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>, priority: Priority, due: DateTime<Utc>) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            priority,
            due,
            reminder_days: None,
            reminder_hours: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_reminder_days(mut self, days: u32) -> Self {
        self.reminder_days = Some(days);
        self
    }

    pub fn with_reminder_hours(mut self, hours: u32) -> Self {
        self.reminder_hours = Some(hours);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(TaskError::InvalidTaskData("title is required".to_string()));
        }
        Ok(())
    }
}

/// Wire-shaped draft where every field may be missing.
///
/// Converting into a [`TaskDraft`] is where structurally absent fields are caught.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskDraftInput {
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub due: Option<DateTime<Utc>>,
    #[serde(default)]
    pub reminder_days: Option<u32>,
    #[serde(default)]
    pub reminder_hours: Option<u32>,
}

impl TryFrom<TaskDraftInput> for TaskDraft {
    type Error = TaskError;

    fn try_from(input: TaskDraftInput) -> Result<Self> {
        let missing = |field: &str| TaskError::InvalidTaskData(format!("{field} is required"));

        let draft = TaskDraft {
            title: input.title.ok_or_else(|| missing("title"))?,
            description: input.description.unwrap_or_default(),
            priority: input.priority.ok_or_else(|| missing("priority"))?,
            due: input.due.ok_or_else(|| missing("due"))?,
            reminder_days: input.reminder_days,
            reminder_hours: input.reminder_hours,
        };
        draft.validate()?;
        Ok(draft)
    }
}

/// Partial update. `None` keeps the current value; for the reminder fields
/// `Some(None)` clears the offset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub due: Option<DateTime<Utc>>,
    pub reminder_days: Option<Option<u32>>,
    pub reminder_hours: Option<Option<u32>>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        *self == TaskPatch::default()
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(title) = &self.title {
            if title.trim().is_empty() {
                return Err(TaskError::InvalidTaskData("title cannot be blank".to_string()));
            }
        }
        Ok(())
    }
}

/// List filter, matching the task service's `status` / `priority` query params.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
}

impl TaskFilter {
    pub fn matches(&self, task: &Task) -> bool {
        self.status.is_none_or(|s| task.status == s)
            && self.priority.is_none_or(|p| task.priority == p)
    }
}
