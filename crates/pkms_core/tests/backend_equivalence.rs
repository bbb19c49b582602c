//! Replays one operation sequence against both backends and checks that
//! `list` and `search` observe identical content and order. Timestamps are
//! store-assigned wall-clock values, so they are masked before comparison.

use chrono::{TimeZone, Utc};
use pkms_core::{
    EntryFilter, JsonStore, KnowledgeEntry, KnowledgeStore, ListOptions, NewEntry, NewTask,
    Priority, SqliteStore, Status, Task, TaskFilter, TaskPatch, TaskStore,
};
use tempfile::TempDir;

fn replay(store: &(impl TaskStore + KnowledgeStore)) {
    let mut auth = NewTask::new("Write authentication docs");
    auth.note = Some("cover refresh tokens".to_string());
    auth.priority = Priority::High;
    auth.due = Some("2025-06-01".parse().unwrap());
    auth.tags.insert("docs".to_string());

    let mut chores = NewTask::new("water plants");
    chores.priority = Priority::Low;

    let urgent = {
        let mut draft = NewTask::new("rotate signing keys");
        draft.priority = Priority::Urgent;
        draft.categories.insert("security".to_string());
        draft
    };

    let auth_id = store.add_task(auth).unwrap();
    let chores_id = store.add_task(chores).unwrap();
    let urgent_id = store.add_task(urgent).unwrap();

    store.complete_task(chores_id).unwrap();
    store
        .update_task(
            auth_id,
            &TaskPatch {
                status: Some(Status::InProgress),
                ..TaskPatch::default()
            },
        )
        .unwrap();
    store.delete_task(urgent_id).unwrap();
    // Deleted ids are not handed out again in this sequence.
    store.add_task(NewTask::new("triage inbox")).unwrap();

    let mut entry = NewEntry::new("auth notes", "docs about authentication tokens");
    entry.tags.insert("auth".to_string());
    let entry_id = store.add_entry(entry).unwrap();
    store.add_entry(NewEntry::new("gardening", "watering schedule")).unwrap();
    store.link_task(entry_id, auth_id).unwrap();
}

/// Masks wall-clock fields so structural equality is meaningful.
fn mask_task(mut task: Task) -> Task {
    let fixed = Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap();
    task.created_at = fixed;
    task.completed_at = task.completed_at.map(|_| fixed);
    task
}

fn mask_entry(mut entry: KnowledgeEntry) -> KnowledgeEntry {
    let fixed = Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap();
    entry.created_at = fixed;
    entry.updated_at = fixed;
    entry
}

#[test]
fn list_and_search_agree_across_backends() {
    let dir = TempDir::new().unwrap();
    let json = JsonStore::open(dir.path()).unwrap();
    let sqlite = SqliteStore::open_in_memory().unwrap();

    replay(&json);
    replay(&sqlite);

    for options in [
        ListOptions::default(),
        ListOptions { include_done: true },
    ] {
        let json_tasks: Vec<Task> = json
            .list_tasks(&options)
            .unwrap()
            .into_iter()
            .map(mask_task)
            .collect();
        let sqlite_tasks: Vec<Task> = sqlite
            .list_tasks(&options)
            .unwrap()
            .into_iter()
            .map(mask_task)
            .collect();
        assert_eq!(json_tasks, sqlite_tasks);
    }

    let filters = [
        TaskFilter::with_query("docs"),
        TaskFilter::with_query(""),
        TaskFilter {
            status: Some(Status::Completed),
            ..TaskFilter::default()
        },
        TaskFilter {
            priority: Some(Priority::High),
            tags: vec!["docs".to_string()],
            ..TaskFilter::default()
        },
    ];
    for filter in &filters {
        let json_hits: Vec<Task> = json
            .search_tasks(filter)
            .unwrap()
            .into_iter()
            .map(mask_task)
            .collect();
        let sqlite_hits: Vec<Task> = sqlite
            .search_tasks(filter)
            .unwrap()
            .into_iter()
            .map(mask_task)
            .collect();
        assert_eq!(json_hits, sqlite_hits, "task filter {filter:?} diverged");
    }

    let json_entries: Vec<KnowledgeEntry> = json
        .list_entries()
        .unwrap()
        .into_iter()
        .map(mask_entry)
        .collect();
    let sqlite_entries: Vec<KnowledgeEntry> = sqlite
        .list_entries()
        .unwrap()
        .into_iter()
        .map(mask_entry)
        .collect();
    assert_eq!(json_entries, sqlite_entries);

    let entry_filter = EntryFilter::with_query("authentication");
    let json_hits: Vec<KnowledgeEntry> = json
        .search_entries(&entry_filter)
        .unwrap()
        .into_iter()
        .map(mask_entry)
        .collect();
    let sqlite_hits: Vec<KnowledgeEntry> = sqlite
        .search_entries(&entry_filter)
        .unwrap()
        .into_iter()
        .map(mask_entry)
        .collect();
    assert_eq!(json_hits, sqlite_hits);
}

#[test]
fn id_assignment_matches_across_backends() {
    let dir = TempDir::new().unwrap();
    let json = JsonStore::open(dir.path()).unwrap();
    let sqlite = SqliteStore::open_in_memory().unwrap();

    for store in [&json as &dyn TaskStore, &sqlite as &dyn TaskStore] {
        let a = store.add_task(NewTask::new("a")).unwrap();
        let b = store.add_task(NewTask::new("b")).unwrap();
        store.delete_task(a).unwrap();
        let c = store.add_task(NewTask::new("c")).unwrap();
        assert_eq!((a, b, c), (1, 2, 3));
    }
}
