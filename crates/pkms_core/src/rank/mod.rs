//! Priority ordering, cross-entity relevance and gap detection.
//!
//! # Responsibility
//! - Order tasks deterministically for suggestion output.
//! - Score knowledge entries against a task by bag-of-words overlap.
//! - Detect task topics with no knowledge coverage.
//!
//! # Invariants
//! - Task ordering is a strict total order: priority rank, then due date
//!   (missing due sorts last), then ascending id.
//! - Relevance is `|intersection| / |task tokens|`, 0 for an empty task
//!   token set; this is a cheap, explainable overlap heuristic, not an
//!   embedding similarity.
//! - All functions are pure; nothing here touches a store.

use crate::model::knowledge::KnowledgeEntry;
use crate::model::task::{Priority, Task};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// Minimum overlap score for an entry to count as related.
///
/// Inherited display heuristic; kept as a named constant rather than a
/// different inferred value.
pub const RELEVANCE_THRESHOLD: f64 = 0.2;

/// Upper bound on reported knowledge-gap words.
pub const GAP_SAMPLE_LIMIT: usize = 5;

static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+").expect("valid word regex"));

/// Integer sort rank for a priority level: urgent sorts first.
pub fn priority_rank(priority: Priority) -> u8 {
    match priority {
        Priority::Urgent => 0,
        Priority::High => 1,
        Priority::Normal => 2,
        Priority::Low => 3,
    }
}

/// Sorts tasks by (priority rank, due date, id), ascending.
///
/// A task without a due date sorts after every task that has one. The id
/// tie-break makes the order strict and the output deterministic.
pub fn rank_tasks(mut tasks: Vec<Task>) -> Vec<Task> {
    tasks.sort_by_key(|task| {
        (
            priority_rank(task.priority),
            task.due.unwrap_or(NaiveDate::MAX),
            task.id,
        )
    });
    tasks
}

/// Lower-cased word set of a text: maximal alphanumeric runs.
pub fn tokenize(text: &str) -> BTreeSet<String> {
    WORD_RE
        .find_iter(&text.to_lowercase())
        .map(|word| word.as_str().to_string())
        .collect()
}

/// Overlap ratio between a task's text and an entry's text.
pub fn relevance_score(task: &Task, entry: &KnowledgeEntry) -> f64 {
    let task_tokens = tokenize(&task.text());
    if task_tokens.is_empty() {
        return 0.0;
    }

    let entry_tokens = tokenize(&entry.text());
    let common = task_tokens.intersection(&entry_tokens).count();
    common as f64 / task_tokens.len() as f64
}

/// A qualifying entry with its overlap score.
#[derive(Debug, Clone, PartialEq)]
pub struct RelatedEntry<'a> {
    pub score: f64,
    pub entry: &'a KnowledgeEntry,
}

/// Entries scoring strictly above [`RELEVANCE_THRESHOLD`] against the task,
/// ordered by descending score, ties broken by ascending entry id.
pub fn related_entries<'a>(task: &Task, entries: &'a [KnowledgeEntry]) -> Vec<RelatedEntry<'a>> {
    let mut related: Vec<RelatedEntry<'a>> = entries
        .iter()
        .map(|entry| RelatedEntry {
            score: relevance_score(task, entry),
            entry,
        })
        .filter(|scored| scored.score > RELEVANCE_THRESHOLD)
        .collect();

    related.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then(a.entry.id.cmp(&b.entry.id))
    });
    related
}

/// Outcome of knowledge-gap detection.
///
/// Zero tasks or zero entries is reported explicitly instead of an empty
/// list, so callers can tell "add more data" apart from "no gaps".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GapReport {
    /// Not enough data to detect gaps: no tasks or no knowledge entries.
    InsufficientData,
    /// Every task word is covered by some knowledge entry.
    NoGaps,
    /// Bounded sample of task words with no knowledge coverage, sorted.
    Gaps(Vec<String>),
}

/// Words appearing across task text but in no knowledge entry text.
pub fn knowledge_gaps(tasks: &[Task], entries: &[KnowledgeEntry]) -> GapReport {
    if tasks.is_empty() || entries.is_empty() {
        return GapReport::InsufficientData;
    }

    let mut task_words = BTreeSet::new();
    for task in tasks {
        task_words.extend(tokenize(&task.text()));
    }

    let mut entry_words = BTreeSet::new();
    for entry in entries {
        entry_words.extend(tokenize(&entry.text()));
    }

    let missing: Vec<String> = task_words
        .difference(&entry_words)
        .take(GAP_SAMPLE_LIMIT)
        .cloned()
        .collect();

    if missing.is_empty() {
        GapReport::NoGaps
    } else {
        GapReport::Gaps(missing)
    }
}

#[cfg(test)]
mod tests {
    use super::{
        knowledge_gaps, rank_tasks, related_entries, relevance_score, tokenize, GapReport,
        RELEVANCE_THRESHOLD,
    };
    use crate::model::knowledge::{KnowledgeEntry, NewEntry};
    use crate::model::task::{NewTask, Priority, Task};
    use chrono::{NaiveDate, TimeZone, Utc};

    fn task(id: u64, priority: Priority, due: Option<&str>) -> Task {
        let mut draft = NewTask::new(format!("task {id}"));
        draft.priority = priority;
        draft.due = due.map(|d| d.parse().unwrap());
        draft.into_record(id, Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap())
    }

    fn entry(id: u64, title: &str, content: &str) -> KnowledgeEntry {
        NewEntry::new(title, content)
            .into_record(id, Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap())
    }

    #[test]
    fn ordering_is_priority_then_due_then_id() {
        let tasks = vec![
            task(1, Priority::Low, None),
            task(2, Priority::Urgent, Some("2025-01-01")),
            task(3, Priority::Urgent, Some("2024-06-01")),
        ];

        let ranked = rank_tasks(tasks);
        let ids: Vec<u64> = ranked.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[test]
    fn missing_due_sorts_after_any_due_date() {
        let tasks = vec![
            task(1, Priority::High, None),
            task(2, Priority::High, Some("2099-12-31")),
        ];
        let ranked = rank_tasks(tasks);
        assert_eq!(ranked[0].id, 2);
    }

    #[test]
    fn equal_tuples_fall_back_to_ascending_id() {
        let tasks = vec![
            task(9, Priority::Normal, Some("2025-05-01")),
            task(4, Priority::Normal, Some("2025-05-01")),
        ];
        let ranked = rank_tasks(tasks);
        assert_eq!(ranked[0].id, 4);
    }

    #[test]
    fn tokenize_lowercases_and_splits_on_non_word_runs() {
        let tokens = tokenize("Write, AUTH-docs now!");
        let expected: Vec<&str> = vec!["auth", "docs", "now", "write"];
        assert_eq!(tokens.iter().map(String::as_str).collect::<Vec<_>>(), expected);
    }

    #[test]
    fn relevance_matches_two_of_three_task_tokens() {
        let mut draft = NewTask::new("Write authentication docs");
        draft.due = Some(NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());
        let task = draft.into_record(1, Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
        let entry = entry(1, "auth", "docs about authentication tokens");

        let score = relevance_score(&task, &entry);
        assert!((score - 2.0 / 3.0).abs() < 1e-9);
        assert!(score > RELEVANCE_THRESHOLD);
    }

    #[test]
    fn relevance_is_zero_for_empty_task_token_set() {
        let mut task = task(1, Priority::Normal, None);
        task.title = "!!!".to_string();
        let entry = entry(1, "anything", "at all");
        assert_eq!(relevance_score(&task, &entry), 0.0);
    }

    #[test]
    fn related_entries_are_sorted_by_score_then_id() {
        let task = NewTask::new("rust sqlite store")
            .into_record(1, Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
        let entries = vec![
            entry(1, "rust", "notes on rust"),
            entry(2, "store", "sqlite store internals in rust"),
            entry(3, "cooking", "pasta recipes"),
        ];

        let related = related_entries(&task, &entries);
        let ids: Vec<u64> = related.iter().map(|r| r.entry.id).collect();
        assert_eq!(ids, vec![2, 1]);
        assert!(related[0].score >= related[1].score);
    }

    #[test]
    fn gap_detection_reports_insufficient_data() {
        let tasks = vec![task(1, Priority::Normal, None)];
        let entries = vec![entry(1, "a", "b")];

        assert_eq!(knowledge_gaps(&[], &entries), GapReport::InsufficientData);
        assert_eq!(knowledge_gaps(&tasks, &[]), GapReport::InsufficientData);
    }

    #[test]
    fn gap_detection_finds_uncovered_task_words() {
        let mut draft = NewTask::new("deploy kubernetes cluster");
        draft.note = Some("with terraform".to_string());
        let tasks = vec![draft.into_record(1, Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap())];
        let entries = vec![entry(1, "kubernetes", "cluster basics")];

        match knowledge_gaps(&tasks, &entries) {
            GapReport::Gaps(words) => {
                assert!(words.contains(&"deploy".to_string()));
                assert!(words.contains(&"terraform".to_string()));
                assert!(!words.contains(&"kubernetes".to_string()));
                assert!(words.len() <= super::GAP_SAMPLE_LIMIT);
            }
            other => panic!("expected gaps, got {other:?}"),
        }
    }

    #[test]
    fn gap_detection_reports_full_coverage() {
        let tasks = vec![task(1, Priority::Normal, None)];
        let entries = vec![entry(1, "task 1", "task 1 details")];
        assert_eq!(knowledge_gaps(&tasks, &entries), GapReport::NoGaps);
    }
}
