//! Daily brief composition over store, ranking and gap results.
//!
//! # Responsibility
//! - Aggregate status counts, top-ranked tasks, their related knowledge and
//!   the gap report into one user-facing structure.
//! - Render the structure as deterministic plain text.
//!
//! # Invariants
//! - The composer performs no persistence and no search of its own; it only
//!   combines results computed by the other components.
//! - Optional enrichment never replaces the heuristic output: when the
//!   enricher is absent or fails, the brief is complete without it.

use crate::model::knowledge::KnowledgeEntry;
use crate::model::task::{Status, Task};
use crate::rank::{knowledge_gaps, rank_tasks, related_entries, GapReport};
use std::fmt::Write as _;

/// Display limits for the brief.
///
/// Defaults mirror the inherited "top 3 tasks, 2 related entries" display
/// heuristic; both are configurable rather than hardcoded.
#[derive(Debug, Clone, Copy)]
pub struct BriefOptions {
    /// How many top-ranked active tasks to suggest.
    pub top_tasks: usize,
    /// How many related knowledge entries to show per suggested task.
    pub related_limit: usize,
}

impl Default for BriefOptions {
    fn default() -> Self {
        Self {
            top_tasks: 3,
            related_limit: 2,
        }
    }
}

/// Optional external text-completion collaborator.
///
/// Any failure (timeout, auth, malformed response) must be mapped to `None`
/// by the implementation; the composer treats absence as "no enrichment" and
/// never as an error.
pub trait BriefEnricher {
    fn summarize(&self, prompt: &str) -> Option<String>;
}

/// Task counts grouped by lifecycle status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub not_started: usize,
    pub in_progress: usize,
    pub completed: usize,
}

impl StatusCounts {
    pub fn tally(tasks: &[Task]) -> Self {
        let mut counts = Self::default();
        for task in tasks {
            match task.status {
                Status::NotStarted => counts.not_started += 1,
                Status::InProgress => counts.in_progress += 1,
                Status::Completed => counts.completed += 1,
            }
        }
        counts
    }

    pub fn total(&self) -> usize {
        self.not_started + self.in_progress + self.completed
    }
}

/// One suggested task with its related knowledge entries.
#[derive(Debug, Clone, PartialEq)]
pub struct Suggestion {
    pub task: Task,
    /// (score, entry) pairs, best first, capped at `related_limit`.
    pub related: Vec<(f64, KnowledgeEntry)>,
}

/// Composed daily brief.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyBrief {
    pub counts: StatusCounts,
    pub suggestions: Vec<Suggestion>,
    pub gaps: GapReport,
    /// Optional external enrichment text; `None` on absence or failure.
    pub enrichment: Option<String>,
}

/// Builds the brief from already-loaded record sets.
pub fn compose_brief(
    tasks: &[Task],
    entries: &[KnowledgeEntry],
    options: &BriefOptions,
    enricher: Option<&dyn BriefEnricher>,
) -> DailyBrief {
    let counts = StatusCounts::tally(tasks);

    let active: Vec<Task> = tasks.iter().filter(|t| !t.is_done()).cloned().collect();
    let suggestions: Vec<Suggestion> = rank_tasks(active)
        .into_iter()
        .take(options.top_tasks)
        .map(|task| {
            let related = related_entries(&task, entries)
                .into_iter()
                .take(options.related_limit)
                .map(|scored| (scored.score, scored.entry.clone()))
                .collect();
            Suggestion { task, related }
        })
        .collect();

    let gaps = knowledge_gaps(tasks, entries);

    let enrichment = enricher.and_then(|e| {
        let titles: Vec<&str> = suggestions.iter().map(|s| s.task.title.as_str()).collect();
        let prompt = format!(
            "Summarize a plan for these tasks in two sentences: {}",
            titles.join("; ")
        );
        e.summarize(&prompt)
    });

    DailyBrief {
        counts,
        suggestions,
        gaps,
        enrichment,
    }
}

impl DailyBrief {
    /// Renders the brief as deterministic plain text.
    pub fn render(&self) -> String {
        let mut out = String::from("Daily Brief\n");
        let _ = writeln!(
            out,
            "Tasks: {} total (not-started {}, in-progress {}, completed {})",
            self.counts.total(),
            self.counts.not_started,
            self.counts.in_progress,
            self.counts.completed
        );

        if self.suggestions.is_empty() {
            out.push_str("No open tasks. Add some tasks to get started.\n");
        } else {
            out.push_str("Suggested actions:\n");
            for (index, suggestion) in self.suggestions.iter().enumerate() {
                let task = &suggestion.task;
                let _ = write!(out, "{}. {} (priority: {}", index + 1, task.title, task.priority);
                if let Some(due) = task.due {
                    let _ = write!(out, ", due: {due}");
                }
                out.push_str(")\n");

                for (_, entry) in &suggestion.related {
                    let _ = writeln!(out, "   related: {}", entry.title);
                }
            }
        }

        match &self.gaps {
            GapReport::InsufficientData => {
                out.push_str("Knowledge gaps: add more tasks and knowledge entries to get started.\n");
            }
            GapReport::NoGaps => {
                out.push_str("Knowledge gaps: none, your notes cover current tasks.\n");
            }
            GapReport::Gaps(words) => {
                let _ = writeln!(out, "Knowledge gaps: consider writing about {}", words.join(", "));
            }
        }

        if let Some(enrichment) = &self.enrichment {
            let _ = writeln!(out, "Assistant: {enrichment}");
        }

        out
    }
}
