//! Task domain model.
//!
//! # Responsibility
//! - Define the single persisted entity and its lifecycle helpers.
//! - Own the title validation predicate used by controller and store.
//!
//! # Invariants
//! - `id == UNSAVED_TASK_ID` means the task was never persisted.
//! - Accepted titles are trimmed and contain at least two characters.
//! - `is_completed` starts as `false` and only moves to `true`.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Store-assigned task identifier (SQLite rowid).
pub type TaskId = i64;

/// Sentinel id carried by tasks that have not been persisted yet.
pub const UNSAVED_TASK_ID: TaskId = 0;

/// Minimum number of characters in a trimmed title.
pub const MIN_TITLE_CHARS: usize = 2;

/// Inline message shown next to title inputs that fail validation.
pub const TITLE_TOO_SHORT_MESSAGE: &str = "Task name should be more than 1 symbol";

/// Title rule violations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskValidationError {
    /// Trimmed title has fewer than `MIN_TITLE_CHARS` characters.
    TitleTooShort { length: usize },
}

impl Display for TaskValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TitleTooShort { length } => write!(
                f,
                "task title must contain at least {MIN_TITLE_CHARS} characters, got {length}"
            ),
        }
    }
}

impl Error for TaskValidationError {}

/// Observed lifecycle state of a task.
///
/// `Done` is terminal: no operation moves a task back to `Active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Active,
    Done,
}

/// A titled, completable unit of work.
///
/// Wire names follow the persisted column layout (`id`, `title`,
/// `isCompleted`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default)]
    pub is_completed: bool,
}

impl Task {
    /// Builds an unsaved task from raw user input.
    ///
    /// The title is trimmed before it is stored on the record.
    ///
    /// # Errors
    /// - Returns `TaskValidationError::TitleTooShort` when the trimmed title
    ///   is shorter than two characters.
    pub fn new(title: &str) -> Result<Self, TaskValidationError> {
        Ok(Self {
            id: UNSAVED_TASK_ID,
            title: normalize_title(title)?,
            is_completed: false,
        })
    }

    /// Returns whether the store has assigned an id to this task.
    pub fn is_persisted(&self) -> bool {
        self.id != UNSAVED_TASK_ID
    }

    pub fn status(&self) -> TaskStatus {
        if self.is_completed {
            TaskStatus::Done
        } else {
            TaskStatus::Active
        }
    }

    /// Re-checks the title rule on an existing record.
    pub fn validate(&self) -> Result<(), TaskValidationError> {
        normalize_title(&self.title).map(|_| ())
    }
}

/// Returns whether `title` would be accepted by add and update paths.
///
/// Presentation code calls this on every keystroke to enable or disable
/// submit controls.
pub fn is_valid_title(title: &str) -> bool {
    title_length(title) >= MIN_TITLE_CHARS
}

/// Trims `title` and checks the length rule.
///
/// # Errors
/// - Returns `TaskValidationError::TitleTooShort` with the trimmed character
///   count when the rule fails.
pub fn normalize_title(title: &str) -> Result<String, TaskValidationError> {
    let length = title_length(title);
    if length < MIN_TITLE_CHARS {
        return Err(TaskValidationError::TitleTooShort { length });
    }
    Ok(title.trim().to_string())
}

fn title_length(title: &str) -> usize {
    title.trim().chars().count()
}
