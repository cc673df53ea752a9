//! Core domain logic for the task list.
//! This crate is the single source of truth for task invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod runtime;
pub mod service;

pub use config::{ConfigError, CoreConfig};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::filter::{ParseTaskFilterError, TaskFilter};
pub use model::task::{
    is_valid_title, Task, TaskId, TaskStatus, TaskValidationError, TITLE_TOO_SHORT_MESSAGE,
};
pub use repo::store_worker::{StoreEvent, StoreHandle, StoreRequest, StoreWorker};
pub use repo::task_store::{SqliteTaskStore, StoreError, StoreResult, TaskStore};
pub use runtime::{RuntimeError, TaskRuntime};
pub use service::intent::Intent;
pub use service::task_list_controller::{
    ControllerError, ControllerResult, ErrorPresentation, TaskListController, VisibleTaskList,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
