//! Task entity and its insert/update payloads.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::errors::HomecueError;
use super::frequency::Frequency;
use super::ids::{TaskId, UserId, VendorId};
use super::state::TaskStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = HomecueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            other => Err(HomecueError::UnknownPriority(other.to_string())),
        }
    }
}

/// A maintenance task as stored.
///
/// `id` and `created_at` are assigned by the store on insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub due_date: DateTime<Utc>,
    #[serde(default)]
    pub reminder_time: Option<DateTime<Utc>>,
    pub frequency: Frequency,
    pub priority: Priority,
    pub status: TaskStatus,
    #[serde(default)]
    pub is_recurring: bool,
    pub user_id: UserId,
    #[serde(default)]
    pub vendor_id: Option<VendorId>,
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Completed and still flagged recurring.
    pub fn is_rollover_eligible(&self) -> bool {
        self.status == TaskStatus::Completed && self.is_recurring
    }

    /// How long before the due date the reminder fires.
    pub fn reminder_offset(&self) -> Option<TimeDelta> {
        self.reminder_time.map(|reminder| self.due_date - reminder)
    }

    /// The next occurrence of this task.
    ///
    /// Copies the descriptive fields, advances the due date by the frequency
    /// rule and keeps the reminder at the same offset before the new due date.
    pub fn next_occurrence(&self) -> NewTask {
        let due_date = self.frequency.advance(self.due_date);
        let reminder_time = self.reminder_offset().and_then(|offset| {
            let reminder = due_date.checked_sub_signed(offset);
            if reminder.is_none() {
                tracing::warn!(task_id = %self.id, %due_date, "reminder out of range, dropping it");
            }
            reminder
        });

        NewTask {
            title: self.title.clone(),
            description: self.description.clone(),
            due_date,
            reminder_time,
            frequency: self.frequency,
            priority: self.priority,
            status: TaskStatus::Pending,
            is_recurring: true,
            user_id: self.user_id,
            vendor_id: self.vendor_id,
        }
    }
}

/// Insert payload for a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub due_date: DateTime<Utc>,
    pub reminder_time: Option<DateTime<Utc>>,
    pub frequency: Frequency,
    pub priority: Priority,
    pub status: TaskStatus,
    pub is_recurring: bool,
    pub user_id: UserId,
    pub vendor_id: Option<VendorId>,
}

impl NewTask {
    /// A pending, non-recurring task with no reminder.
    pub fn new(
        title: impl Into<String>,
        user_id: UserId,
        due_date: DateTime<Utc>,
        frequency: Frequency,
        priority: Priority,
    ) -> Self {
        Self {
            title: title.into(),
            description: None,
            due_date,
            reminder_time: None,
            frequency,
            priority,
            status: TaskStatus::Pending,
            is_recurring: false,
            user_id,
            vendor_id: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn reminder_at(mut self, reminder_time: DateTime<Utc>) -> Self {
        self.reminder_time = Some(reminder_time);
        self
    }

    pub fn recurring(mut self) -> Self {
        self.is_recurring = true;
        self
    }

    pub fn status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    pub fn vendor(mut self, vendor_id: VendorId) -> Self {
        self.vendor_id = Some(vendor_id);
        self
    }

    /// Materialize into a stored task.
    pub fn into_task(self, id: TaskId, created_at: DateTime<Utc>) -> Task {
        Task {
            id,
            title: self.title,
            description: self.description,
            due_date: self.due_date,
            reminder_time: self.reminder_time,
            frequency: self.frequency,
            priority: self.priority,
            status: self.status,
            is_recurring: self.is_recurring,
            user_id: self.user_id,
            vendor_id: self.vendor_id,
            created_at,
        }
    }
}

/// Fields that can be updated on a task.
///
/// `None` leaves a field untouched. For nullable columns the inner `Option`
/// is the new value (`Some(None)` clears it).
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub due_date: Option<DateTime<Utc>>,
    pub reminder_time: Option<Option<DateTime<Utc>>>,
    pub frequency: Option<Frequency>,
    pub priority: Option<Priority>,
    pub status: Option<TaskStatus>,
    pub is_recurring: Option<bool>,
    pub vendor_id: Option<Option<VendorId>>,
}

impl TaskUpdate {
    pub fn status(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn recurring(is_recurring: bool) -> Self {
        Self {
            is_recurring: Some(is_recurring),
            ..Self::default()
        }
    }

    pub fn apply(self, task: &mut Task) {
        if let Some(title) = self.title {
            task.title = title;
        }
        if let Some(description) = self.description {
            task.description = description;
        }
        if let Some(due_date) = self.due_date {
            task.due_date = due_date;
        }
        if let Some(reminder_time) = self.reminder_time {
            task.reminder_time = reminder_time;
        }
        if let Some(frequency) = self.frequency {
            task.frequency = frequency;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(is_recurring) = self.is_recurring {
            task.is_recurring = is_recurring;
        }
        if let Some(vendor_id) = self.vendor_id {
            task.vendor_id = vendor_id;
        }
    }
}

/// The part of a user account the reminder job needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}
