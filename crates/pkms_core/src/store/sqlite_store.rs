//! Relational-table backend: one row per record in SQLite.
//!
//! # Responsibility
//! - Persist tasks and entries in per-entity tables keyed by id.
//! - Keep SQL and column encoding details inside this module.
//!
//! # Invariants
//! - Tag/category/link sets are flattened to comma-delimited text on write
//!   and split back into sets on read; references are newline-delimited to
//!   keep their order and allow commas inside citations.
//! - Due dates and timestamps are stored as ISO-8601 text; timestamps use a
//!   fixed nanosecond width so lexical order equals chronological order.
//! - Updates are read-modify-write through the same patch code the document
//!   backend uses, so observable semantics are identical.

use crate::db::{open_db, open_db_in_memory};
use crate::model::knowledge::{EntryId, EntryPatch, KnowledgeEntry, NewEntry};
use crate::model::task::{NewTask, Priority, Status, Task, TaskId, TaskPatch};
use crate::store::{
    next_id, KnowledgeStore, ListOptions, PersistenceError, StoreResult, TaskStore,
};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::{params, Connection, Row};
use std::collections::BTreeSet;
use std::path::Path;

const TASK_SELECT_SQL: &str = "SELECT
    id,
    title,
    note,
    priority,
    due,
    categories,
    tags,
    status,
    created_at,
    completed_at
FROM tasks";

const ENTRY_SELECT_SQL: &str = "SELECT
    id,
    title,
    content,
    categories,
    tags,
    refs,
    related_tasks,
    created_at,
    updated_at
FROM entries";

/// SQLite-backed store for both entity kinds.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens a database file, applying pending migrations.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Ok(Self { conn: open_db(path)? })
    }

    /// Opens an in-memory database, mostly for tests and the
    /// backend-equivalence harness.
    pub fn open_in_memory() -> StoreResult<Self> {
        Ok(Self {
            conn: open_db_in_memory()?,
        })
    }

    /// Wraps an already opened connection, applying pending migrations.
    pub fn from_connection(mut conn: Connection) -> StoreResult<Self> {
        crate::db::migrations::apply_migrations(&mut conn)?;
        Ok(Self { conn })
    }
}

impl TaskStore for SqliteStore {
    fn add_task(&self, draft: NewTask) -> StoreResult<TaskId> {
        draft.validate()?;

        // Id assignment matches the document backend: max existing id + 1.
        let id = next_id(existing_ids(&self.conn, "tasks")?.into_iter());
        let task = draft.into_record(id, Utc::now());

        self.conn.execute(
            "INSERT INTO tasks (
                id, title, note, priority, due, categories, tags, status,
                created_at, completed_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10);",
            params![
                to_db_id(task.id)?,
                task.title.as_str(),
                task.note.as_deref(),
                task.priority.as_str(),
                task.due.map(|d| d.to_string()),
                join_labels(&task.categories),
                join_labels(&task.tags),
                task.status.as_str(),
                timestamp_to_db(task.created_at),
                task.completed_at.map(timestamp_to_db),
            ],
        )?;

        Ok(id)
    }

    fn get_task(&self, id: TaskId) -> StoreResult<Option<Task>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TASK_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query(params![to_db_id(id)?])?;

        if let Some(row) = rows.next()? {
            return Ok(Some(parse_task_row(row)?));
        }
        Ok(None)
    }

    fn list_tasks(&self, options: &ListOptions) -> StoreResult<Vec<Task>> {
        let mut sql = TASK_SELECT_SQL.to_string();
        if !options.include_done {
            sql.push_str(" WHERE status <> 'completed'");
        }
        sql.push_str(" ORDER BY id ASC;");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([])?;
        let mut tasks = Vec::new();
        while let Some(row) = rows.next()? {
            tasks.push(parse_task_row(row)?);
        }
        Ok(tasks)
    }

    fn update_task(&self, id: TaskId, patch: &TaskPatch) -> StoreResult<Option<Task>> {
        let Some(mut task) = self.get_task(id)? else {
            return Ok(None);
        };

        patch.apply(&mut task, Utc::now())?;

        self.conn.execute(
            "UPDATE tasks
             SET
                title = ?2,
                note = ?3,
                priority = ?4,
                due = ?5,
                categories = ?6,
                tags = ?7,
                status = ?8,
                completed_at = ?9
             WHERE id = ?1;",
            params![
                to_db_id(task.id)?,
                task.title.as_str(),
                task.note.as_deref(),
                task.priority.as_str(),
                task.due.map(|d| d.to_string()),
                join_labels(&task.categories),
                join_labels(&task.tags),
                task.status.as_str(),
                task.completed_at.map(timestamp_to_db),
            ],
        )?;

        Ok(Some(task))
    }

    fn delete_task(&self, id: TaskId) -> StoreResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM tasks WHERE id = ?1;", params![to_db_id(id)?])?;
        Ok(changed > 0)
    }
}

impl KnowledgeStore for SqliteStore {
    fn add_entry(&self, draft: NewEntry) -> StoreResult<EntryId> {
        draft.validate()?;

        let id = next_id(existing_ids(&self.conn, "entries")?.into_iter());
        let entry = draft.into_record(id, Utc::now());

        self.conn.execute(
            "INSERT INTO entries (
                id, title, content, categories, tags, refs, related_tasks,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9);",
            params![
                to_db_id(entry.id)?,
                entry.title.as_str(),
                entry.content.as_str(),
                join_labels(&entry.categories),
                join_labels(&entry.tags),
                join_references(&entry.references),
                join_task_links(&entry.related_tasks),
                timestamp_to_db(entry.created_at),
                timestamp_to_db(entry.updated_at),
            ],
        )?;

        Ok(id)
    }

    fn get_entry(&self, id: EntryId) -> StoreResult<Option<KnowledgeEntry>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ENTRY_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query(params![to_db_id(id)?])?;

        if let Some(row) = rows.next()? {
            return Ok(Some(parse_entry_row(row)?));
        }
        Ok(None)
    }

    fn list_entries(&self) -> StoreResult<Vec<KnowledgeEntry>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ENTRY_SELECT_SQL} ORDER BY id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            entries.push(parse_entry_row(row)?);
        }
        Ok(entries)
    }

    fn update_entry(&self, id: EntryId, patch: &EntryPatch) -> StoreResult<Option<KnowledgeEntry>> {
        let Some(mut entry) = self.get_entry(id)? else {
            return Ok(None);
        };

        patch.apply(&mut entry, Utc::now())?;

        self.conn.execute(
            "UPDATE entries
             SET
                title = ?2,
                content = ?3,
                categories = ?4,
                tags = ?5,
                refs = ?6,
                related_tasks = ?7,
                updated_at = ?8
             WHERE id = ?1;",
            params![
                to_db_id(entry.id)?,
                entry.title.as_str(),
                entry.content.as_str(),
                join_labels(&entry.categories),
                join_labels(&entry.tags),
                join_references(&entry.references),
                join_task_links(&entry.related_tasks),
                timestamp_to_db(entry.updated_at),
            ],
        )?;

        Ok(Some(entry))
    }

    fn delete_entry(&self, id: EntryId) -> StoreResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM entries WHERE id = ?1;", params![to_db_id(id)?])?;
        Ok(changed > 0)
    }
}

fn existing_ids(conn: &Connection, table: &'static str) -> StoreResult<Vec<u64>> {
    let mut stmt = conn.prepare(&format!("SELECT id FROM {table};"))?;
    let mut rows = stmt.query([])?;
    let mut ids = Vec::new();
    while let Some(row) = rows.next()? {
        ids.push(from_db_id(row.get::<_, i64>(0)?, table)?);
    }
    Ok(ids)
}

fn parse_task_row(row: &Row<'_>) -> StoreResult<Task> {
    let due = match row.get::<_, Option<String>>("due")? {
        Some(text) => Some(parse_date(&text, "tasks")?),
        None => None,
    };
    let completed_at = match row.get::<_, Option<String>>("completed_at")? {
        Some(text) => Some(parse_timestamp(&text, "tasks")?),
        None => None,
    };

    Ok(Task {
        id: from_db_id(row.get::<_, i64>("id")?, "tasks")?,
        title: row.get("title")?,
        note: row.get("note")?,
        // Unknown persisted enum values fall back to the defaults, same as
        // the document backend's serde path.
        priority: Priority::parse(&row.get::<_, String>("priority")?),
        due,
        categories: split_labels(&row.get::<_, String>("categories")?),
        tags: split_labels(&row.get::<_, String>("tags")?),
        status: Status::parse(&row.get::<_, String>("status")?),
        created_at: parse_timestamp(&row.get::<_, String>("created_at")?, "tasks")?,
        completed_at,
    })
}

fn parse_entry_row(row: &Row<'_>) -> StoreResult<KnowledgeEntry> {
    Ok(KnowledgeEntry {
        id: from_db_id(row.get::<_, i64>("id")?, "entries")?,
        title: row.get("title")?,
        content: row.get("content")?,
        categories: split_labels(&row.get::<_, String>("categories")?),
        tags: split_labels(&row.get::<_, String>("tags")?),
        references: split_references(&row.get::<_, String>("refs")?),
        related_tasks: split_task_links(&row.get::<_, String>("related_tasks")?),
        created_at: parse_timestamp(&row.get::<_, String>("created_at")?, "entries")?,
        updated_at: parse_timestamp(&row.get::<_, String>("updated_at")?, "entries")?,
    })
}

fn to_db_id(id: u64) -> StoreResult<i64> {
    i64::try_from(id).map_err(|_| {
        PersistenceError::Decode {
            table: "ids",
            message: format!("id {id} exceeds the storable range"),
        }
        .into()
    })
}

fn from_db_id(raw: i64, table: &'static str) -> StoreResult<u64> {
    u64::try_from(raw).map_err(|_| {
        PersistenceError::Decode {
            table,
            message: format!("negative id {raw}"),
        }
        .into()
    })
}

fn join_labels(labels: &BTreeSet<String>) -> String {
    labels.iter().cloned().collect::<Vec<_>>().join(",")
}

fn split_labels(raw: &str) -> BTreeSet<String> {
    // No trimming: labels must round-trip exactly so both backends observe
    // the same values.
    raw.split(',')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn join_references(references: &[String]) -> String {
    references.join("\n")
}

fn split_references(raw: &str) -> Vec<String> {
    raw.split('\n')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn join_task_links(links: &BTreeSet<u64>) -> String {
    links
        .iter()
        .map(u64::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

fn split_task_links(raw: &str) -> BTreeSet<u64> {
    raw.split(',')
        .filter_map(|s| s.trim().parse::<u64>().ok())
        .collect()
}

fn timestamp_to_db(value: DateTime<Utc>) -> String {
    // Fixed nanosecond width keeps lexical order chronological and the
    // round-trip exact.
    value.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn parse_timestamp(raw: &str, table: &'static str) -> StoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|err| {
            PersistenceError::Decode {
                table,
                message: format!("invalid timestamp `{raw}`: {err}"),
            }
            .into()
        })
}

fn parse_date(raw: &str, table: &'static str) -> StoreResult<NaiveDate> {
    raw.parse::<NaiveDate>().map_err(|err| {
        PersistenceError::Decode {
            table,
            message: format!("invalid date `{raw}`: {err}"),
        }
        .into()
    })
}
