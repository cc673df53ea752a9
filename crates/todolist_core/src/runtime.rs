//! Wiring for a running task list core.
//!
//! # Responsibility
//! - Bring up logging, the shared database, the store and its worker.
//! - Hand out controllers bound to that worker.

use crate::config::CoreConfig;
use crate::db::{shared_connection, DbError};
use crate::logging::init_logging;
use crate::repo::store_worker::{StoreHandle, StoreWorker};
use crate::repo::task_store::{SqliteTaskStore, StoreError, TaskStore};
use crate::service::task_list_controller::{ControllerResult, TaskListController};
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum RuntimeError {
    Logging(String),
    Db(DbError),
    Store(StoreError),
    /// The store worker thread could not be started.
    Spawn(std::io::Error),
}

impl Display for RuntimeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Logging(message) => write!(f, "logging init failed: {message}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
            Self::Spawn(err) => write!(f, "failed to start store worker: {err}"),
        }
    }
}

impl Error for RuntimeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Logging(_) => None,
            Self::Db(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::Spawn(err) => Some(err),
        }
    }
}

impl From<DbError> for RuntimeError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<StoreError> for RuntimeError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// A store worker plus the handle controllers attach to.
pub struct TaskRuntime {
    worker: StoreWorker,
    handle: StoreHandle,
}

impl TaskRuntime {
    /// Starts the runtime described by `config`.
    ///
    /// File logging is initialized only when `config.log_dir` is set. The
    /// database is opened through the process-wide shared handle.
    pub fn start(config: &CoreConfig) -> Result<Self, RuntimeError> {
        if let Some(log_dir) = &config.log_dir {
            init_logging(&config.log_level, log_dir).map_err(RuntimeError::Logging)?;
        }

        let conn = shared_connection(&config.db_path)?;
        let store = SqliteTaskStore::try_from_shared(conn)?;
        Self::with_store(store)
    }

    /// Starts a worker over an already-built store.
    pub fn with_store<S>(store: S) -> Result<Self, RuntimeError>
    where
        S: TaskStore + 'static,
    {
        let (worker, handle) = StoreWorker::spawn(store).map_err(RuntimeError::Spawn)?;
        Ok(Self { worker, handle })
    }

    pub fn handle(&self) -> StoreHandle {
        self.handle.clone()
    }

    /// Creates a controller subscribed to this runtime's worker.
    pub fn controller(&self) -> ControllerResult<TaskListController> {
        TaskListController::new(self.handle())
    }

    /// Applies queued requests, then stops the worker.
    pub fn shutdown(self) {
        self.worker.shutdown();
    }
}
