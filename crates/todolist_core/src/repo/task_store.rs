//! Task store contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide list/get/insert/update/delete/set-completed over `tasks`.
//! - Reject connections whose schema does not match the expected layout.
//!
//! # Invariants
//! - Every mutation is a single statement executed under the connection
//!   mutex, so writes to one record never interleave.
//! - Listing order is ascending `id`, which is insertion order.
//! - Persisted booleans other than 0/1 are reported, not coerced.

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::{DbError, SharedConnection};
use crate::model::task::{normalize_title, Task, TaskId, TaskValidationError};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex, MutexGuard};

const TASKS_TABLE: &str = "tasks";
const REQUIRED_TASK_COLUMNS: [&str; 3] = ["id", "title", "isCompleted"];
const TASK_SELECT_SQL: &str = "SELECT id, title, isCompleted FROM tasks";

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors returned by task store implementations.
#[derive(Debug)]
pub enum StoreError {
    /// Title rejected by the shared validation rule.
    Validation(TaskValidationError),
    /// No task with this id exists.
    NotFound(TaskId),
    Db(DbError),
    /// A persisted row cannot be mapped to a `Task`.
    InvalidData(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// A previous holder of the connection lock panicked.
    ConnectionPoisoned,
    /// The background store worker has stopped accepting requests.
    WorkerStopped,
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "task not found: {id}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted task data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} is not migrated to {expected_version}"
            ),
            Self::MissingRequiredTable(table) => write!(f, "required table `{table}` is missing"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "required column `{table}.{column}` is missing")
            }
            Self::ConnectionPoisoned => write!(f, "task database lock is poisoned"),
            Self::WorkerStopped => write!(f, "task store worker has stopped"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TaskValidationError> for StoreError {
    fn from(value: TaskValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Durable task storage consumed by the controller.
///
/// Implementations must be movable onto the store worker thread.
pub trait TaskStore: Send {
    /// Returns the full collection in insertion order.
    fn list_tasks(&self) -> StoreResult<Vec<Task>>;
    fn get_task(&self, id: TaskId) -> StoreResult<Option<Task>>;
    /// Persists a new active task and returns its assigned id.
    fn insert_task(&self, title: &str) -> StoreResult<TaskId>;
    fn update_title(&self, id: TaskId, title: &str) -> StoreResult<()>;
    /// Removes the task permanently.
    fn delete_task(&self, id: TaskId) -> StoreResult<()>;
    fn set_completed(&self, id: TaskId, completed: bool) -> StoreResult<()>;
}

/// SQLite-backed task store.
pub struct SqliteTaskStore {
    conn: SharedConnection,
}

impl SqliteTaskStore {
    /// Wraps an owned, migrated connection.
    ///
    /// # Errors
    /// - Returns schema errors when `conn` was not opened through
    ///   `open_db`/`open_db_in_memory` or the table layout is incomplete.
    pub fn try_new(conn: Connection) -> StoreResult<Self> {
        ensure_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Wraps the process-wide shared connection.
    pub fn try_from_shared(conn: SharedConnection) -> StoreResult<Self> {
        {
            let guard = conn.lock().map_err(|_| StoreError::ConnectionPoisoned)?;
            ensure_schema(&guard)?;
        }
        Ok(Self { conn })
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::ConnectionPoisoned)
    }
}

impl TaskStore for SqliteTaskStore {
    fn list_tasks(&self) -> StoreResult<Vec<Task>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!("{TASK_SELECT_SQL} ORDER BY id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut tasks = Vec::new();

        while let Some(row) = rows.next()? {
            tasks.push(parse_task_row(row)?);
        }

        Ok(tasks)
    }

    fn get_task(&self, id: TaskId) -> StoreResult<Option<Task>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!("{TASK_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_task_row(row)?));
        }

        Ok(None)
    }

    fn insert_task(&self, title: &str) -> StoreResult<TaskId> {
        let title = normalize_title(title)?;
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO tasks (title, isCompleted) VALUES (?1, 0);",
            [title.as_str()],
        )?;

        Ok(conn.last_insert_rowid())
    }

    fn update_title(&self, id: TaskId, title: &str) -> StoreResult<()> {
        let title = normalize_title(title)?;
        let changed = self.lock()?.execute(
            "UPDATE tasks SET title = ?1 WHERE id = ?2;",
            params![title, id],
        )?;

        if changed == 0 {
            return Err(StoreError::NotFound(id));
        }

        Ok(())
    }

    fn delete_task(&self, id: TaskId) -> StoreResult<()> {
        let changed = self
            .lock()?
            .execute("DELETE FROM tasks WHERE id = ?1;", [id])?;

        if changed == 0 {
            return Err(StoreError::NotFound(id));
        }

        Ok(())
    }

    fn set_completed(&self, id: TaskId, completed: bool) -> StoreResult<()> {
        let changed = self.lock()?.execute(
            "UPDATE tasks SET isCompleted = ?1 WHERE id = ?2;",
            params![bool_to_int(completed), id],
        )?;

        if changed == 0 {
            return Err(StoreError::NotFound(id));
        }

        Ok(())
    }
}

fn ensure_schema(conn: &Connection) -> StoreResult<()> {
    let actual_version = current_user_version(conn)?;
    let expected_version = latest_version();
    if actual_version < expected_version {
        return Err(StoreError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }
    if actual_version > expected_version {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: actual_version,
            latest_supported: expected_version,
        }
        .into());
    }

    let table_exists = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1;",
            [TASKS_TABLE],
            |_| Ok(()),
        )
        .optional()?
        .is_some();
    if !table_exists {
        return Err(StoreError::MissingRequiredTable(TASKS_TABLE));
    }

    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?1);")?;
    let columns = stmt
        .query_map([TASKS_TABLE], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    if let Some(column) = REQUIRED_TASK_COLUMNS
        .iter()
        .copied()
        .find(|required| !columns.iter().any(|name| name == *required))
    {
        return Err(StoreError::MissingRequiredColumn {
            table: TASKS_TABLE,
            column,
        });
    }

    Ok(())
}

fn parse_task_row(row: &Row<'_>) -> StoreResult<Task> {
    let id: TaskId = row.get("id")?;
    let is_completed = match row.get::<_, i64>("isCompleted")? {
        0 => false,
        1 => true,
        other => {
            return Err(StoreError::InvalidData(format!(
                "invalid isCompleted value `{other}` for task {id}"
            )));
        }
    };

    Ok(Task {
        id,
        title: row.get("title")?,
        is_completed,
    })
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
