//! Task status state machine.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::errors::HomecueError;

/// Status of a maintenance task.
///
/// State transitions:
/// - Pending -> Completed (user marks it done)
/// - Pending -> Overdue (overdue sweep)
/// - Overdue -> Completed (user marks it done late)
/// - Completed -> Pending (user toggles it back)
///
/// A task holds exactly one status at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Completed,
    Overdue,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Completed => "completed",
            TaskStatus::Overdue => "overdue",
        }
    }

    /// Is `next` reachable from `self` in one step?
    ///
    /// Staying in the same status is not a transition and returns false.
    pub fn can_transition_to(self, next: TaskStatus) -> bool {
        matches!(
            (self, next),
            (TaskStatus::Pending, TaskStatus::Completed)
                | (TaskStatus::Pending, TaskStatus::Overdue)
                | (TaskStatus::Overdue, TaskStatus::Completed)
                | (TaskStatus::Completed, TaskStatus::Pending)
        )
    }

    /// Not yet done (pending or overdue).
    pub fn is_open(self) -> bool {
        !matches!(self, TaskStatus::Completed)
    }

    /// Status a completion toggle moves to.
    pub fn toggled(self) -> TaskStatus {
        match self {
            TaskStatus::Completed => TaskStatus::Pending,
            TaskStatus::Pending | TaskStatus::Overdue => TaskStatus::Completed,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = HomecueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TaskStatus::Pending),
            "completed" => Ok(TaskStatus::Completed),
            "overdue" => Ok(TaskStatus::Overdue),
            other => Err(HomecueError::UnknownStatus(other.to_string())),
        }
    }
}
