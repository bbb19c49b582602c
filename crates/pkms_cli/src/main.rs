//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `pkms_core` linkage.
//! - Keep output deterministic for quick local sanity checks.
//!
//! The interactive shell proper lives outside this workspace; this probe
//! only exercises the core wiring end to end.

use pkms_core::{compose_brief, BriefOptions, KnowledgeStore, SqliteStore, TaskStore};
use pkms_core::{ListOptions, NewEntry, NewTask};
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("pkms_core version={}", pkms_core::core_version());

    match smoke() {
        Ok(brief) => {
            print!("{brief}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("smoke check failed: {err}");
            ExitCode::FAILURE
        }
    }
}

fn smoke() -> Result<String, pkms_core::StoreError> {
    let store = SqliteStore::open_in_memory()?;

    store.add_task(NewTask::new("write authentication docs"))?;
    store.add_entry(NewEntry::new("auth notes", "docs about authentication tokens"))?;

    let tasks = store.list_tasks(&ListOptions { include_done: true })?;
    let entries = store.list_entries()?;
    let brief = compose_brief(&tasks, &entries, &BriefOptions::default(), None);
    Ok(brief.render())
}
