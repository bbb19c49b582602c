//! Knowledge entry domain model.
//!
//! # Responsibility
//! - Define the canonical knowledge record, its draft and change-set types.
//! - Keep weak task links as plain ids; dangling links are tolerated.
//!
//! # Invariants
//! - `id` is positive, store-assigned and never reused for another entry.
//! - `updated_at` is refreshed on every applied field mutation.
//! - `references` keeps caller order; `related_tasks` is an unordered set.

use crate::model::task::{TaskId, ValidationError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Stable identifier for knowledge entries within one store instance.
pub type EntryId = u64;

/// Canonical knowledge record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeEntry {
    /// Store-assigned id, unique within one store and never reused.
    pub id: EntryId,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub categories: BTreeSet<String>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    /// Ordered free-text citations.
    #[serde(default)]
    pub references: Vec<String>,
    /// Weak task links; deleting a task does not cascade here.
    #[serde(default)]
    pub related_tasks: BTreeSet<TaskId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl KnowledgeEntry {
    /// Concatenated title + content text used by the relevance engine.
    pub fn text(&self) -> String {
        format!("{} {}", self.title, self.content)
    }
}

/// Draft for creating an entry; the store assigns id and timestamps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewEntry {
    pub title: String,
    pub content: String,
    pub categories: BTreeSet<String>,
    pub tags: BTreeSet<String>,
    pub references: Vec<String>,
    pub related_tasks: BTreeSet<TaskId>,
}

impl NewEntry {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            ..Self::default()
        }
    }

    /// Checks required fields before the store persists anything.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::EmptyField("title"));
        }
        if self.content.trim().is_empty() {
            return Err(ValidationError::EmptyField("content"));
        }
        Ok(())
    }

    /// Materializes the persisted record once the store has an id.
    pub fn into_record(self, id: EntryId, created_at: DateTime<Utc>) -> KnowledgeEntry {
        KnowledgeEntry {
            id,
            title: self.title,
            content: self.content,
            categories: self.categories,
            tags: self.tags,
            references: self.references,
            related_tasks: self.related_tasks,
            created_at,
            updated_at: created_at,
        }
    }
}

/// Explicit change-set for entry updates.
///
/// Only mutable fields are listed; `id`/`created_at` cannot be overwritten
/// by construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub categories: Option<BTreeSet<String>>,
    pub tags: Option<BTreeSet<String>>,
    pub references: Option<Vec<String>>,
    pub related_tasks: Option<BTreeSet<TaskId>>,
}

impl EntryPatch {
    /// True when the patch would change nothing.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.categories.is_none()
            && self.tags.is_none()
            && self.references.is_none()
            && self.related_tasks.is_none()
    }

    /// Applies the change-set in place and refreshes `updated_at`.
    pub fn apply(&self, entry: &mut KnowledgeEntry, now: DateTime<Utc>) -> Result<(), ValidationError> {
        if let Some(title) = &self.title {
            if title.trim().is_empty() {
                return Err(ValidationError::EmptyField("title"));
            }
            entry.title = title.clone();
        }
        if let Some(content) = &self.content {
            if content.trim().is_empty() {
                return Err(ValidationError::EmptyField("content"));
            }
            entry.content = content.clone();
        }
        if let Some(categories) = &self.categories {
            entry.categories = categories.clone();
        }
        if let Some(tags) = &self.tags {
            entry.tags = tags.clone();
        }
        if let Some(references) = &self.references {
            entry.references = references.clone();
        }
        if let Some(related_tasks) = &self.related_tasks {
            entry.related_tasks = related_tasks.clone();
        }
        entry.updated_at = now;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{EntryPatch, KnowledgeEntry, NewEntry};
    use crate::model::task::ValidationError;
    use chrono::{TimeZone, Utc};

    fn sample_entry() -> KnowledgeEntry {
        NewEntry::new("auth notes", "docs about authentication tokens")
            .into_record(1, Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap())
    }

    #[test]
    fn draft_validation_requires_title_and_content() {
        let missing_title = NewEntry::new(" ", "body");
        assert_eq!(
            missing_title.validate().unwrap_err(),
            ValidationError::EmptyField("title")
        );

        let missing_content = NewEntry::new("title", "");
        assert_eq!(
            missing_content.validate().unwrap_err(),
            ValidationError::EmptyField("content")
        );
    }

    #[test]
    fn created_and_updated_start_equal() {
        let entry = sample_entry();
        assert_eq!(entry.created_at, entry.updated_at);
    }

    #[test]
    fn patch_refreshes_updated_at() {
        let mut entry = sample_entry();
        let later = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();

        let patch = EntryPatch {
            tags: Some(["auth".to_string()].into_iter().collect()),
            ..EntryPatch::default()
        };
        patch.apply(&mut entry, later).unwrap();

        assert_eq!(entry.updated_at, later);
        assert!(entry.tags.contains("auth"));
        assert_eq!(entry.created_at, Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn entry_round_trips_through_json() {
        let mut entry = sample_entry();
        entry.references = vec!["RFC 6749".to_string(), "team wiki, auth page".to_string()];
        entry.related_tasks.insert(42);

        let json = serde_json::to_string(&entry).unwrap();
        let decoded: KnowledgeEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, entry);
    }
}
