use pkms_core::{
    EntryFilter, JsonStore, KnowledgeStore, NewEntry, NewTask, Priority, SqliteStore, Status,
    TaskFilter, TaskStore,
};
use tempfile::TempDir;

fn seeded(store: &(impl TaskStore + KnowledgeStore)) {
    let mut auth = NewTask::new("Write authentication docs");
    auth.note = Some("cover refresh tokens".to_string());
    auth.priority = Priority::High;
    auth.tags.insert("docs".to_string());
    store.add_task(auth).unwrap();

    let mut chores = NewTask::new("water plants");
    chores.categories.insert("home".to_string());
    let chores_id = store.add_task(chores).unwrap();
    store.complete_task(chores_id).unwrap();

    let mut entry = NewEntry::new("Auth notes", "docs about authentication tokens");
    entry.tags.insert("auth".to_string());
    store.add_entry(entry).unwrap();
}

fn run_on_both_backends(scenario: impl Fn(&dyn Searchable)) {
    let dir = TempDir::new().unwrap();
    let json = JsonStore::open(dir.path()).unwrap();
    seeded(&json);
    scenario(&json);

    let sqlite = SqliteStore::open_in_memory().unwrap();
    seeded(&sqlite);
    scenario(&sqlite);
}

trait Searchable: TaskStore + KnowledgeStore {}
impl<T: TaskStore + KnowledgeStore> Searchable for T {}

#[test]
fn query_search_spans_completed_tasks() {
    run_on_both_backends(|store| {
        // Unlike list, search runs over the full record set.
        let hits = store.search_tasks(&TaskFilter::with_query("water")).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].status, Status::Completed);
    });
}

#[test]
fn empty_query_matches_every_record() {
    run_on_both_backends(|store| {
        let hits = store.search_tasks(&TaskFilter::with_query("")).unwrap();
        assert_eq!(hits.len(), 2);

        let hits = store.search_tasks(&TaskFilter::default()).unwrap();
        assert_eq!(hits.len(), 2);
    });
}

#[test]
fn combined_predicates_narrow_results() {
    run_on_both_backends(|store| {
        let filter = TaskFilter {
            query: Some("docs".to_string()),
            priority: Some(Priority::High),
            tags: vec!["docs".to_string()],
            ..TaskFilter::default()
        };
        let hits = store.search_tasks(&filter).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Write authentication docs");

        let mismatch = TaskFilter {
            query: Some("docs".to_string()),
            priority: Some(Priority::Low),
            ..TaskFilter::default()
        };
        assert!(store.search_tasks(&mismatch).unwrap().is_empty());
    });
}

#[test]
fn entry_search_matches_title_and_content() {
    run_on_both_backends(|store| {
        let hits = store
            .search_entries(&EntryFilter::with_query("AUTHENTICATION"))
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Auth notes");

        let by_tag = EntryFilter {
            tags: vec!["auth".to_string()],
            ..EntryFilter::default()
        };
        assert_eq!(store.search_entries(&by_tag).unwrap().len(), 1);
    });
}

#[test]
fn search_does_not_mutate_the_store() {
    run_on_both_backends(|store| {
        let before = store.search_tasks(&TaskFilter::default()).unwrap();
        store.search_tasks(&TaskFilter::with_query("water")).unwrap();
        let after = store.search_tasks(&TaskFilter::default()).unwrap();
        assert_eq!(before, after);
    });
}
