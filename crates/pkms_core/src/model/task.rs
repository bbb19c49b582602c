//! Task domain model.
//!
//! # Responsibility
//! - Define the canonical task record, its draft and change-set types.
//! - Own the status/completed_at transition rule shared by all backends.
//!
//! # Invariants
//! - `id` is positive, store-assigned and never reused for another task.
//! - `completed_at` is `Some` exactly while `status == Completed`.
//! - Enum decoding is lenient: unknown persisted values fall back to the
//!   defaults (`Normal`, `NotStarted`) instead of failing the whole record.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Stable identifier for tasks within one store instance.
pub type TaskId = u64;

/// Task urgency level used by ranking and filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum Priority {
    Urgent,
    High,
    #[default]
    Normal,
    Low,
}

impl Priority {
    /// Canonical wire/storage spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Urgent => "urgent",
            Self::High => "high",
            Self::Normal => "normal",
            Self::Low => "low",
        }
    }

    /// Parses a stored value, falling back to `Normal` for unknown input.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "urgent" => Self::Urgent,
            "high" => Self::High,
            "low" => Self::Low,
            _ => Self::Normal,
        }
    }
}

impl From<Priority> for String {
    fn from(value: Priority) -> Self {
        value.as_str().to_string()
    }
}

impl From<String> for Priority {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl Display for Priority {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Task lifecycle state.
///
/// The legacy boolean `done` notion is an alias for `Completed`; see
/// [`Task::is_done`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum Status {
    #[default]
    NotStarted,
    InProgress,
    Completed,
}

impl Status {
    /// Canonical wire/storage spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotStarted => "not-started",
            Self::InProgress => "in-progress",
            Self::Completed => "completed",
        }
    }

    /// Parses a stored value, falling back to `NotStarted` for unknown input.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "in-progress" => Self::InProgress,
            "completed" => Self::Completed,
            _ => Self::NotStarted,
        }
    }
}

impl From<Status> for String {
    fn from(value: Status) -> Self {
        value.as_str().to_string()
    }
}

impl From<String> for Status {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl Display for Status {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validation failure for record drafts and patches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required text field is empty or whitespace-only.
    EmptyField(&'static str),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyField(field) => write!(f, "required field `{field}` cannot be empty"),
        }
    }
}

impl Error for ValidationError {}

/// Canonical task record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Store-assigned id, unique within one store and never reused.
    pub id: TaskId,
    pub title: String,
    /// Optional free-text note/description.
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    /// Optional due date (no time component).
    #[serde(default)]
    pub due: Option<NaiveDate>,
    #[serde(default)]
    pub categories: BTreeSet<String>,
    /// Separate namespace from `categories`.
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub status: Status,
    /// Set once at creation, immutable afterwards.
    pub created_at: DateTime<Utc>,
    /// `Some` exactly while `status == Completed`.
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Legacy `done` alias: true iff the task is completed.
    pub fn is_done(&self) -> bool {
        self.status == Status::Completed
    }

    /// Applies a status change while keeping `completed_at` consistent.
    ///
    /// Entering `Completed` stamps `completed_at` with `now`; leaving it
    /// clears the stamp. Re-setting `Completed` on an already completed task
    /// keeps the original stamp.
    pub fn set_status(&mut self, status: Status, now: DateTime<Utc>) {
        match status {
            Status::Completed => {
                if self.status != Status::Completed {
                    self.completed_at = Some(now);
                }
            }
            _ => self.completed_at = None,
        }
        self.status = status;
    }

    /// Concatenated title + note text used by the relevance engine.
    pub fn text(&self) -> String {
        match &self.note {
            Some(note) => format!("{} {}", self.title, note),
            None => self.title.clone(),
        }
    }
}

/// Draft for creating a task; the store assigns id and timestamps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub note: Option<String>,
    pub priority: Priority,
    pub due: Option<NaiveDate>,
    pub categories: BTreeSet<String>,
    pub tags: BTreeSet<String>,
}

impl NewTask {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Checks required fields before the store persists anything.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::EmptyField("title"));
        }
        Ok(())
    }

    /// Materializes the persisted record once the store has an id.
    pub fn into_record(self, id: TaskId, created_at: DateTime<Utc>) -> Task {
        Task {
            id,
            title: self.title,
            note: self.note,
            priority: self.priority,
            due: self.due,
            categories: self.categories,
            tags: self.tags,
            status: Status::NotStarted,
            created_at,
            completed_at: None,
        }
    }
}

/// Explicit change-set for task updates.
///
/// Only mutable fields are listed; unknown fields cannot be expressed, and
/// `id`/`created_at` cannot be overwritten by construction. `due` uses a
/// nested option so `Some(None)` clears an existing due date.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub note: Option<Option<String>>,
    pub priority: Option<Priority>,
    pub due: Option<Option<NaiveDate>>,
    pub categories: Option<BTreeSet<String>>,
    pub tags: Option<BTreeSet<String>>,
    pub status: Option<Status>,
}

impl TaskPatch {
    /// True when the patch would change nothing.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.note.is_none()
            && self.priority.is_none()
            && self.due.is_none()
            && self.categories.is_none()
            && self.tags.is_none()
            && self.status.is_none()
    }

    /// Applies the change-set in place.
    ///
    /// Status changes go through [`Task::set_status`] so the
    /// `completed_at` invariant holds on every path.
    pub fn apply(&self, task: &mut Task, now: DateTime<Utc>) -> Result<(), ValidationError> {
        if let Some(title) = &self.title {
            if title.trim().is_empty() {
                return Err(ValidationError::EmptyField("title"));
            }
            task.title = title.clone();
        }
        if let Some(note) = &self.note {
            task.note = note.clone();
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(due) = self.due {
            task.due = due;
        }
        if let Some(categories) = &self.categories {
            task.categories = categories.clone();
        }
        if let Some(tags) = &self.tags {
            task.tags = tags.clone();
        }
        if let Some(status) = self.status {
            task.set_status(status, now);
        }
        Ok(())
    }
}
