//! Todo repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide the CRUD surface over the `todos` table.
//! - Own timestamp bookkeeping for mutations and the list ordering policy.
//!
//! # Invariants
//! - Write paths call `Todo::validate_content()` before any SQL mutation.
//! - `update_todo` never rewrites `created_at`.
//! - `updated_at` strictly increases on every update/toggle, even when the
//!   wall clock stalls.
//! - Read paths reject malformed rows instead of masking them.

use crate::db::migrations::{latest_version, schema_version};
use crate::db::DbError;
use crate::model::todo::{Todo, TodoId, TodoValidationError};
use crate::repo::mapper::{to_domain, to_record};
use crate::repo::record::TodoRecord;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

const TODO_SELECT_SQL: &str = "SELECT
    id,
    title,
    description,
    due_date,
    location,
    is_completed,
    created_at,
    updated_at
FROM todos";

const TODOS_TABLE: &str = "todos";
const REQUIRED_TODO_COLUMNS: &[&str] = &[
    "id",
    "title",
    "description",
    "due_date",
    "location",
    "is_completed",
    "created_at",
    "updated_at",
];

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for todo persistence and query operations.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("{0}")]
    Validation(#[from] TodoValidationError),
    #[error("{0}")]
    Db(#[from] DbError),
    #[error("todo not found: {0}")]
    NotFound(TodoId),
    #[error("invalid persisted todo data: {0}")]
    InvalidData(String),
    #[error(
        "connection schema version {actual_version} does not match expected {expected_version}"
    )]
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    #[error("required table `{0}` is missing")]
    MissingRequiredTable(&'static str),
    #[error("required column `{table}.{column}` is missing")]
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Ordering policy applied by `list_todos`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TodoOrdering {
    /// Descending creation time.
    #[default]
    NewestFirst,
    /// Open before completed, then ascending due date with undated todos
    /// first, then descending creation time.
    CompletionThenDue,
}

impl TodoOrdering {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NewestFirst => "newest_first",
            Self::CompletionThenDue => "completion_then_due",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "newest_first" => Some(Self::NewestFirst),
            "completion_then_due" => Some(Self::CompletionThenDue),
            _ => None,
        }
    }

    fn order_by_sql(self) -> &'static str {
        // `id` is the final tie-breaker so equal timestamps list stably.
        match self {
            Self::NewestFirst => "created_at DESC, id ASC",
            Self::CompletionThenDue => {
                "is_completed ASC, due_date ASC, created_at DESC, id ASC"
            }
        }
    }
}

/// Repository interface for todo CRUD operations.
pub trait TodoRepository {
    /// Lists every todo in the requested order.
    fn list_todos(&self, ordering: TodoOrdering) -> RepoResult<Vec<Todo>>;
    fn get_todo(&self, id: TodoId) -> RepoResult<Option<Todo>>;
    /// Inserts a todo, replacing any existing record with the same id.
    fn insert_todo(&self, todo: &Todo) -> RepoResult<TodoId>;
    /// Overwrites the record matched by `todo.id` and returns the stored
    /// value. Caller-supplied timestamps are ignored.
    fn update_todo(&self, todo: &Todo) -> RepoResult<Todo>;
    /// Returns whether a record was removed.
    fn delete_todo(&self, id: TodoId) -> RepoResult<bool>;
    /// Flips completion and returns the stored value, or `None` when absent.
    fn toggle_completion(&self, id: TodoId) -> RepoResult<Option<Todo>>;
    /// Deletes every completed todo and returns how many were removed.
    fn delete_completed(&self) -> RepoResult<usize>;
    fn count_todos(&self) -> RepoResult<u64>;
}

/// SQLite-backed todo repository.
pub struct SqliteTodoRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTodoRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    ///
    /// # Errors
    /// - `UninitializedConnection` when migrations have not been applied.
    /// - `MissingRequiredTable` / `MissingRequiredColumn` when the schema
    ///   does not match the expected shape.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }

    /// Wraps a connection already checked by `try_new`.
    pub(crate) fn new_unchecked(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl TodoRepository for SqliteTodoRepository<'_> {
    fn list_todos(&self, ordering: TodoOrdering) -> RepoResult<Vec<Todo>> {
        let sql = format!("{TODO_SELECT_SQL} ORDER BY {};", ordering.order_by_sql());
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([])?;
        let mut todos = Vec::new();

        while let Some(row) = rows.next()? {
            todos.push(to_domain(parse_todo_row(row)?));
        }

        Ok(todos)
    }

    fn get_todo(&self, id: TodoId) -> RepoResult<Option<Todo>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TODO_SELECT_SQL} WHERE id = ?1;"))?;

        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(to_domain(parse_todo_row(row)?)));
        }

        Ok(None)
    }

    fn insert_todo(&self, todo: &Todo) -> RepoResult<TodoId> {
        let todo = todo.clone().normalized();
        todo.validate()?;
        let record = to_record(&todo);

        self.conn.execute(
            "INSERT OR REPLACE INTO todos (
                id,
                title,
                description,
                due_date,
                location,
                is_completed,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                record.id.to_string(),
                record.title.as_str(),
                record.description.as_deref(),
                record.due_date,
                record.location.as_deref(),
                bool_to_int(record.is_completed),
                record.created_at,
                record.updated_at,
            ],
        )?;

        Ok(record.id)
    }

    fn update_todo(&self, todo: &Todo) -> RepoResult<Todo> {
        let todo = todo.clone().normalized();
        todo.validate_content()?;
        let record = to_record(&todo);

        let tx = self.conn.unchecked_transaction()?;
        let changed = tx.execute(
            "UPDATE todos
             SET
                title = ?2,
                description = ?3,
                due_date = ?4,
                location = ?5,
                is_completed = ?6,
                updated_at = MAX(?7, updated_at + 1)
             WHERE id = ?1;",
            params![
                record.id.to_string(),
                record.title.as_str(),
                record.description.as_deref(),
                record.due_date,
                record.location.as_deref(),
                bool_to_int(record.is_completed),
                now_epoch_ms(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(record.id));
        }

        let stored = select_by_id(&tx, record.id)?.ok_or_else(|| {
            RepoError::InvalidData(format!("updated todo {} vanished on read-back", record.id))
        })?;
        tx.commit()?;
        Ok(stored)
    }

    fn delete_todo(&self, id: TodoId) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM todos WHERE id = ?1;", [id.to_string()])?;
        Ok(changed > 0)
    }

    fn toggle_completion(&self, id: TodoId) -> RepoResult<Option<Todo>> {
        let tx = self.conn.unchecked_transaction()?;
        let changed = tx.execute(
            "UPDATE todos
             SET
                is_completed = 1 - is_completed,
                updated_at = MAX(?2, updated_at + 1)
             WHERE id = ?1;",
            params![id.to_string(), now_epoch_ms()],
        )?;

        if changed == 0 {
            return Ok(None);
        }

        let stored = select_by_id(&tx, id)?;
        tx.commit()?;
        Ok(stored)
    }

    fn delete_completed(&self) -> RepoResult<usize> {
        let removed = self
            .conn
            .execute("DELETE FROM todos WHERE is_completed = 1;", [])?;
        Ok(removed)
    }

    fn count_todos(&self) -> RepoResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM todos;", [], |row| row.get(0))?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative todo count `{count}`")))
    }
}

fn select_by_id(conn: &Connection, id: TodoId) -> RepoResult<Option<Todo>> {
    let record = conn
        .query_row(
            &format!("{TODO_SELECT_SQL} WHERE id = ?1;"),
            [id.to_string()],
            |row| Ok(parse_todo_row(row)),
        )
        .optional()?;
    record.transpose().map(|record| record.map(to_domain))
}

fn parse_todo_row(row: &Row<'_>) -> RepoResult<TodoRecord> {
    let id_text: String = row.get("id")?;
    let id = Uuid::parse_str(&id_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{id_text}` in todos.id"))
    })?;

    let is_completed = match row.get::<_, i64>("is_completed")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid is_completed value `{other}` in todos.is_completed"
            )));
        }
    };

    Ok(TodoRecord {
        id,
        title: row.get("title")?,
        description: row.get("description")?,
        due_date: row.get("due_date")?,
        location: row.get("location")?,
        is_completed,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = schema_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    let table_exists: bool = conn.query_row(
        "SELECT EXISTS(
            SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1
        );",
        [TODOS_TABLE],
        |row| row.get(0),
    )?;
    if !table_exists {
        return Err(RepoError::MissingRequiredTable(TODOS_TABLE));
    }

    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?1);")?;
    let columns = stmt
        .query_map([TODOS_TABLE], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    for column in REQUIRED_TODO_COLUMNS.iter().copied() {
        if !columns.iter().any(|name| name == column) {
            return Err(RepoError::MissingRequiredColumn {
                table: TODOS_TABLE,
                column,
            });
        }
    }

    Ok(())
}

fn now_epoch_ms() -> i64 {
    Utc::now().timestamp_millis()
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
