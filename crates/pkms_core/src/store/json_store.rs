//! Document-file backend: one JSON document per entity kind.
//!
//! # Responsibility
//! - Persist the full record set as a JSON array per read/write cycle.
//! - Keep every mutation durable via write-to-temp + atomic rename.
//!
//! # Invariants
//! - Every mutating call is a full read-modify-write of the document.
//! - A missing or malformed document decodes to an empty record set (logged
//!   as a warning); write failures surface as persistence errors.
//! - Records are kept ordered by ascending id.

use crate::model::knowledge::{EntryId, EntryPatch, KnowledgeEntry, NewEntry};
use crate::model::task::{NewTask, Task, TaskId, TaskPatch};
use crate::store::{next_id, ListOptions, PersistenceError, StoreResult, TaskStore};
use crate::store::KnowledgeStore;
use chrono::Utc;
use log::warn;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const TASKS_DOC: &str = "tasks.json";
const KNOWLEDGE_DOC: &str = "knowledge.json";

/// Document-file store holding both collections under one directory.
pub struct JsonStore {
    tasks_path: PathBuf,
    knowledge_path: PathBuf,
}

impl JsonStore {
    /// Opens (and creates, if needed) the data directory.
    pub fn open(dir: impl AsRef<Path>) -> StoreResult<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).map_err(|source| PersistenceError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        Ok(Self {
            tasks_path: dir.join(TASKS_DOC),
            knowledge_path: dir.join(KNOWLEDGE_DOC),
        })
    }

    /// Path of the tasks document, exposed for diagnostics.
    pub fn tasks_path(&self) -> &Path {
        &self.tasks_path
    }

    /// Path of the knowledge document, exposed for diagnostics.
    pub fn knowledge_path(&self) -> &Path {
        &self.knowledge_path
    }
}

impl TaskStore for JsonStore {
    fn add_task(&self, draft: NewTask) -> StoreResult<TaskId> {
        draft.validate()?;

        let mut tasks: Vec<Task> = read_doc(&self.tasks_path);
        let id = next_id(tasks.iter().map(|t| t.id));
        tasks.push(draft.into_record(id, Utc::now()));
        write_doc(&self.tasks_path, &tasks)?;
        Ok(id)
    }

    fn get_task(&self, id: TaskId) -> StoreResult<Option<Task>> {
        let tasks: Vec<Task> = read_doc(&self.tasks_path);
        Ok(tasks.into_iter().find(|t| t.id == id))
    }

    fn list_tasks(&self, options: &ListOptions) -> StoreResult<Vec<Task>> {
        let mut tasks: Vec<Task> = read_doc(&self.tasks_path);
        if !options.include_done {
            tasks.retain(|t| !t.is_done());
        }
        tasks.sort_by_key(|t| t.id);
        Ok(tasks)
    }

    fn update_task(&self, id: TaskId, patch: &TaskPatch) -> StoreResult<Option<Task>> {
        let mut tasks: Vec<Task> = read_doc(&self.tasks_path);
        let Some(task) = tasks.iter_mut().find(|t| t.id == id) else {
            return Ok(None);
        };

        patch.apply(task, Utc::now())?;
        let updated = task.clone();
        write_doc(&self.tasks_path, &tasks)?;
        Ok(Some(updated))
    }

    fn delete_task(&self, id: TaskId) -> StoreResult<bool> {
        let mut tasks: Vec<Task> = read_doc(&self.tasks_path);
        let before = tasks.len();
        tasks.retain(|t| t.id != id);
        if tasks.len() == before {
            return Ok(false);
        }

        write_doc(&self.tasks_path, &tasks)?;
        Ok(true)
    }
}

impl KnowledgeStore for JsonStore {
    fn add_entry(&self, draft: NewEntry) -> StoreResult<EntryId> {
        draft.validate()?;

        let mut entries: Vec<KnowledgeEntry> = read_doc(&self.knowledge_path);
        let id = next_id(entries.iter().map(|e| e.id));
        entries.push(draft.into_record(id, Utc::now()));
        write_doc(&self.knowledge_path, &entries)?;
        Ok(id)
    }

    fn get_entry(&self, id: EntryId) -> StoreResult<Option<KnowledgeEntry>> {
        let entries: Vec<KnowledgeEntry> = read_doc(&self.knowledge_path);
        Ok(entries.into_iter().find(|e| e.id == id))
    }

    fn list_entries(&self) -> StoreResult<Vec<KnowledgeEntry>> {
        let mut entries: Vec<KnowledgeEntry> = read_doc(&self.knowledge_path);
        entries.sort_by_key(|e| e.id);
        Ok(entries)
    }

    fn update_entry(&self, id: EntryId, patch: &EntryPatch) -> StoreResult<Option<KnowledgeEntry>> {
        let mut entries: Vec<KnowledgeEntry> = read_doc(&self.knowledge_path);
        let Some(entry) = entries.iter_mut().find(|e| e.id == id) else {
            return Ok(None);
        };

        patch.apply(entry, Utc::now())?;
        let updated = entry.clone();
        write_doc(&self.knowledge_path, &entries)?;
        Ok(Some(updated))
    }

    fn delete_entry(&self, id: EntryId) -> StoreResult<bool> {
        let mut entries: Vec<KnowledgeEntry> = read_doc(&self.knowledge_path);
        let before = entries.len();
        entries.retain(|e| e.id != id);
        if entries.len() == before {
            return Ok(false);
        }

        write_doc(&self.knowledge_path, &entries)?;
        Ok(true)
    }
}

/// Reads the whole document, substituting an empty record set when the file
/// is missing, unreadable or malformed. Corruption is logged, not fatal.
fn read_doc<T: DeserializeOwned>(path: &Path) -> Vec<T> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == ErrorKind::NotFound => return Vec::new(),
        Err(err) => {
            warn!(
                "event=doc_read module=store status=unreadable path={} error={err}",
                path.display()
            );
            return Vec::new();
        }
    };

    match serde_json::from_slice(&bytes) {
        Ok(records) => records,
        Err(err) => {
            warn!(
                "event=doc_read module=store status=corrupt path={} error={err}",
                path.display()
            );
            Vec::new()
        }
    }
}

/// Rewrites the whole document durably: serialize to a sibling temp file,
/// then atomically rename over the target. There is no partial-write window
/// larger than the single rename.
fn write_doc<T: Serialize>(path: &Path, records: &[T]) -> StoreResult<()> {
    let json = serde_json::to_vec_pretty(records).map_err(|err| PersistenceError::Io {
        path: path.to_path_buf(),
        source: err.into(),
    })?;

    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, json).map_err(|source| PersistenceError::Io {
        path: tmp_path.clone(),
        source,
    })?;
    fs::rename(&tmp_path, path).map_err(|source| PersistenceError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(())
}
