//! Store contracts and persistence backends.
//!
//! # Responsibility
//! - Define the backend-independent CRUD + query contract for tasks and
//!   knowledge entries.
//! - Isolate document/SQL encoding details inside the backend modules.
//!
//! # Invariants
//! - Ids are assigned by the store (max existing id + 1), never by callers.
//! - Every mutation performs its durable write before returning.
//! - Lookup misses are `Ok(None)` / `Ok(false)` results, never errors; only
//!   validation and persistence failures surface as `StoreError`.
//! - Both backends produce identical `list`/`search` output for identical
//!   operation sequences.

use crate::db::DbError;
use crate::model::knowledge::{EntryId, EntryPatch, KnowledgeEntry, NewEntry};
use crate::model::task::{NewTask, Status, Task, TaskId, TaskPatch, ValidationError};
use crate::search::{self, EntryFilter, TaskFilter};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub mod json_store;
pub mod sqlite_store;

pub type StoreResult<T> = Result<T, StoreError>;

/// Fatal persistence failure writing or reading a backing medium.
#[derive(Debug)]
pub enum PersistenceError {
    /// File I/O failure on the document backend.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Database failure on the relational backend.
    Db(DbError),
    /// A persisted row could not be decoded into a record.
    Decode {
        table: &'static str,
        message: String,
    },
}

impl Display for PersistenceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "store I/O failure at `{}`: {source}", path.display())
            }
            Self::Db(err) => write!(f, "{err}"),
            Self::Decode { table, message } => {
                write!(f, "invalid persisted row in `{table}`: {message}")
            }
        }
    }
}

impl Error for PersistenceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Db(err) => Some(err),
            Self::Decode { .. } => None,
        }
    }
}

/// Store-level error for CRUD and query operations.
#[derive(Debug)]
pub enum StoreError {
    /// Caller input failed validation; never fatal.
    Validation(ValidationError),
    /// Backing medium failed; aborts the current operation.
    Persistence(PersistenceError),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Persistence(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Persistence(err) => Some(err),
        }
    }
}

impl From<ValidationError> for StoreError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<PersistenceError> for StoreError {
    fn from(value: PersistenceError) -> Self {
        Self::Persistence(value)
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Persistence(PersistenceError::Db(value))
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Persistence(PersistenceError::Db(DbError::Sqlite(value)))
    }
}

/// Listing options shared by both backends.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListOptions {
    /// Include completed tasks; default is to hide them.
    pub include_done: bool,
}

/// Backend contract for task persistence.
///
/// `search_tasks` and `complete_task` have shared default implementations on
/// purpose: both are defined in terms of the primitive operations, so every
/// backend observes identical semantics.
pub trait TaskStore {
    /// Validates the draft, assigns the next id, persists and returns it.
    fn add_task(&self, draft: NewTask) -> StoreResult<TaskId>;

    fn get_task(&self, id: TaskId) -> StoreResult<Option<Task>>;

    /// Lists tasks ordered by ascending id.
    fn list_tasks(&self, options: &ListOptions) -> StoreResult<Vec<Task>>;

    /// Applies an explicit change-set; `None` when the id is unknown.
    fn update_task(&self, id: TaskId, patch: &TaskPatch) -> StoreResult<Option<Task>>;

    /// Removes a task. Idempotent: a second delete returns `false`.
    fn delete_task(&self, id: TaskId) -> StoreResult<bool>;

    /// Marks a task completed.
    ///
    /// Returns `false` when the task is missing or already completed,
    /// matching the store's legacy `complete` semantics.
    fn complete_task(&self, id: TaskId) -> StoreResult<bool> {
        match self.get_task(id)? {
            Some(task) if !task.is_done() => {
                let patch = TaskPatch {
                    status: Some(Status::Completed),
                    ..TaskPatch::default()
                };
                Ok(self.update_task(id, &patch)?.is_some())
            }
            _ => Ok(false),
        }
    }

    /// Runs the backend-agnostic filter over the full record set.
    fn search_tasks(&self, filter: &TaskFilter) -> StoreResult<Vec<Task>> {
        let all = self.list_tasks(&ListOptions { include_done: true })?;
        Ok(search::filter_tasks(all, filter))
    }
}

/// Backend contract for knowledge entry persistence.
pub trait KnowledgeStore {
    /// Validates the draft, assigns the next id, persists and returns it.
    fn add_entry(&self, draft: NewEntry) -> StoreResult<EntryId>;

    fn get_entry(&self, id: EntryId) -> StoreResult<Option<KnowledgeEntry>>;

    /// Lists entries ordered by ascending id.
    fn list_entries(&self) -> StoreResult<Vec<KnowledgeEntry>>;

    /// Applies an explicit change-set and refreshes `updated_at`;
    /// `None` when the id is unknown.
    fn update_entry(&self, id: EntryId, patch: &EntryPatch) -> StoreResult<Option<KnowledgeEntry>>;

    /// Removes an entry. Idempotent: a second delete returns `false`.
    fn delete_entry(&self, id: EntryId) -> StoreResult<bool>;

    /// Adds a weak task link to an entry.
    ///
    /// Returns `false` when the entry is missing or the link already exists.
    /// The task id is not checked for existence; links are weak.
    fn link_task(&self, entry_id: EntryId, task_id: TaskId) -> StoreResult<bool> {
        let Some(entry) = self.get_entry(entry_id)? else {
            return Ok(false);
        };
        if entry.related_tasks.contains(&task_id) {
            return Ok(false);
        }

        let mut related = entry.related_tasks;
        related.insert(task_id);
        let patch = EntryPatch {
            related_tasks: Some(related),
            ..EntryPatch::default()
        };
        Ok(self.update_entry(entry_id, &patch)?.is_some())
    }

    /// Runs the backend-agnostic filter over the full record set.
    fn search_entries(&self, filter: &EntryFilter) -> StoreResult<Vec<KnowledgeEntry>> {
        let all = self.list_entries()?;
        Ok(search::filter_entries(all, filter))
    }
}

/// Next id for a freshly inserted record: max existing id + 1.
pub(crate) fn next_id<I: Iterator<Item = u64>>(ids: I) -> u64 {
    ids.max().unwrap_or(0) + 1
}
