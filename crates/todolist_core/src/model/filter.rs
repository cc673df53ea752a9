//! Completion filter over task snapshots.

use crate::model::task::Task;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Predicate over completion state selecting the visible tasks.
///
/// Not persisted; controllers start with `ShowAll`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskFilter {
    #[default]
    ShowAll,
    ShowOnlyDone,
    ExcludeDone,
}

impl TaskFilter {
    /// Every filter, in menu order.
    pub const ALL: [TaskFilter; 3] = [Self::ShowAll, Self::ShowOnlyDone, Self::ExcludeDone];

    /// Menu label for this filter.
    pub fn label(self) -> &'static str {
        match self {
            Self::ShowAll => "Show All",
            Self::ShowOnlyDone => "Show Only Done",
            Self::ExcludeDone => "Exclude Done",
        }
    }

    pub fn matches(self, task: &Task) -> bool {
        match self {
            Self::ShowAll => true,
            Self::ShowOnlyDone => task.is_completed,
            Self::ExcludeDone => !task.is_completed,
        }
    }

    /// Selects the visible subset of `snapshot`, preserving its order.
    pub fn apply(self, snapshot: &[Task]) -> Vec<Task> {
        snapshot
            .iter()
            .filter(|task| self.matches(task))
            .cloned()
            .collect()
    }
}

impl Display for TaskFilter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Unknown filter name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseTaskFilterError(pub String);

impl Display for ParseTaskFilterError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unknown task filter `{}`; expected all|done|active",
            self.0
        )
    }
}

impl std::error::Error for ParseTaskFilterError {}

impl FromStr for TaskFilter {
    type Err = ParseTaskFilterError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "show all" | "show_all" | "all" => Ok(Self::ShowAll),
            "show only done" | "show_only_done" | "done" => Ok(Self::ShowOnlyDone),
            "exclude done" | "exclude_done" | "active" => Ok(Self::ExcludeDone),
            _ => Err(ParseTaskFilterError(value.trim().to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::TaskFilter;
    use crate::model::task::Task;

    fn task(id: i64, done: bool) -> Task {
        Task {
            id,
            title: format!("task {id}"),
            is_completed: done,
        }
    }

    fn ids(tasks: &[Task]) -> Vec<i64> {
        tasks.iter().map(|task| task.id).collect()
    }

    #[test]
    fn apply_selects_by_completion_and_keeps_order() {
        let snapshot = vec![task(1, false), task(2, true), task(3, false)];

        assert_eq!(ids(&TaskFilter::ShowOnlyDone.apply(&snapshot)), vec![2]);
        assert_eq!(ids(&TaskFilter::ExcludeDone.apply(&snapshot)), vec![1, 3]);
        assert_eq!(TaskFilter::ShowAll.apply(&snapshot), snapshot);
    }

    #[test]
    fn done_and_not_done_partition_the_snapshot() {
        let snapshot = vec![task(1, true), task(2, false), task(3, true), task(4, false)];
        let done = TaskFilter::ShowOnlyDone.apply(&snapshot);
        let active = TaskFilter::ExcludeDone.apply(&snapshot);
        assert_eq!(done.len() + active.len(), snapshot.len());
        assert!(done.iter().all(|task| !active.contains(task)));
    }

    #[test]
    fn parses_labels_and_aliases() {
        for filter in TaskFilter::ALL {
            assert_eq!(filter.label().parse::<TaskFilter>().unwrap(), filter);
        }
        assert_eq!("done".parse::<TaskFilter>().unwrap(), TaskFilter::ShowOnlyDone);
        assert_eq!(
            "EXCLUDE_DONE".parse::<TaskFilter>().unwrap(),
            TaskFilter::ExcludeDone
        );
        assert!("later".parse::<TaskFilter>().is_err());
    }

    #[test]
    fn default_is_show_all() {
        assert_eq!(TaskFilter::default(), TaskFilter::ShowAll);
    }
}
