//! Core store + relevance engine for a personal task/knowledge tracker.
//! This crate is the single source of truth for business invariants; CLI and
//! web front ends are thin shims over these APIs.

pub mod brief;
pub mod db;
pub mod logging;
pub mod model;
pub mod rank;
pub mod search;
pub mod store;

pub use brief::{compose_brief, BriefEnricher, BriefOptions, DailyBrief, StatusCounts, Suggestion};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::knowledge::{EntryId, EntryPatch, KnowledgeEntry, NewEntry};
pub use model::task::{NewTask, Priority, Status, Task, TaskId, TaskPatch, ValidationError};
pub use rank::{
    knowledge_gaps, priority_rank, rank_tasks, related_entries, relevance_score, GapReport,
    RelatedEntry, GAP_SAMPLE_LIMIT, RELEVANCE_THRESHOLD,
};
pub use search::{filter_entries, filter_tasks, EntryFilter, TaskFilter};
pub use store::json_store::JsonStore;
pub use store::sqlite_store::SqliteStore;
pub use store::{KnowledgeStore, ListOptions, PersistenceError, StoreError, StoreResult, TaskStore};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
