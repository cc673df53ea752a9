//! Closed set of user intents accepted by the task list controller.

use crate::model::filter::TaskFilter;
use crate::model::task::TaskId;

/// A user-initiated request to mutate tasks or change the filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    AddTask { title: String },
    UpdateTask { id: TaskId, title: String },
    DeleteTask { id: TaskId },
    MarkDone { id: TaskId },
    SetFilter(TaskFilter),
}
