//! Keyword/field matching over in-memory record sets.
//!
//! # Responsibility
//! - Provide the backend-agnostic filter predicates used by store search.
//! - Keep matching pure: the backing store is never mutated.
//!
//! # Invariants
//! - Text matching is case-insensitive substring over title + note/content.
//! - Multiple predicates combine with logical AND.
//! - An empty/blank query text is a no-op filter, not "no matches".

use crate::model::knowledge::KnowledgeEntry;
use crate::model::task::{Priority, Status, Task, TaskId};

/// Filter predicates for task search. All present predicates must match.
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    /// Case-insensitive substring over title and note.
    pub query: Option<String>,
    /// Match when the task carries any of these categories.
    pub categories: Vec<String>,
    /// Match when the task carries any of these tags.
    pub tags: Vec<String>,
    pub status: Option<Status>,
    pub priority: Option<Priority>,
}

impl TaskFilter {
    /// Convenience constructor for plain keyword search.
    pub fn with_query(query: impl Into<String>) -> Self {
        Self {
            query: Some(query.into()),
            ..Self::default()
        }
    }
}

/// Filter predicates for knowledge search. All present predicates must match.
#[derive(Debug, Clone, Default)]
pub struct EntryFilter {
    /// Case-insensitive substring over title and content.
    pub query: Option<String>,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
    /// Match entries holding a weak link to this task.
    pub related_task: Option<TaskId>,
}

impl EntryFilter {
    /// Convenience constructor for plain keyword search.
    pub fn with_query(query: impl Into<String>) -> Self {
        Self {
            query: Some(query.into()),
            ..Self::default()
        }
    }
}

/// Applies the filter, preserving input order.
pub fn filter_tasks(tasks: Vec<Task>, filter: &TaskFilter) -> Vec<Task> {
    tasks
        .into_iter()
        .filter(|task| task_matches(task, filter))
        .collect()
}

/// Applies the filter, preserving input order.
pub fn filter_entries(entries: Vec<KnowledgeEntry>, filter: &EntryFilter) -> Vec<KnowledgeEntry> {
    entries
        .into_iter()
        .filter(|entry| entry_matches(entry, filter))
        .collect()
}

fn task_matches(task: &Task, filter: &TaskFilter) -> bool {
    if let Some(query) = filter.query.as_deref() {
        let haystacks = [Some(task.title.as_str()), task.note.as_deref()];
        if !text_matches(query, haystacks.into_iter().flatten()) {
            return false;
        }
    }
    if !filter.categories.is_empty()
        && !filter.categories.iter().any(|c| task.categories.contains(c))
    {
        return false;
    }
    if !filter.tags.is_empty() && !filter.tags.iter().any(|t| task.tags.contains(t)) {
        return false;
    }
    if let Some(status) = filter.status {
        if task.status != status {
            return false;
        }
    }
    if let Some(priority) = filter.priority {
        if task.priority != priority {
            return false;
        }
    }
    true
}

fn entry_matches(entry: &KnowledgeEntry, filter: &EntryFilter) -> bool {
    if let Some(query) = filter.query.as_deref() {
        let haystacks = [entry.title.as_str(), entry.content.as_str()];
        if !text_matches(query, haystacks.into_iter()) {
            return false;
        }
    }
    if !filter.categories.is_empty()
        && !filter.categories.iter().any(|c| entry.categories.contains(c))
    {
        return false;
    }
    if !filter.tags.is_empty() && !filter.tags.iter().any(|t| entry.tags.contains(t)) {
        return false;
    }
    if let Some(task_id) = filter.related_task {
        if !entry.related_tasks.contains(&task_id) {
            return false;
        }
    }
    true
}

fn text_matches<'a>(query: &str, mut haystacks: impl Iterator<Item = &'a str>) -> bool {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    haystacks.any(|haystack| haystack.to_lowercase().contains(&needle))
}
