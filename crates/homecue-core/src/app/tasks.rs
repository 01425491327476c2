//! TaskService - ユーザー操作側のタスク API
//!
//! 状態遷移の検証はここで行う（ストアは検証しない）。

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use tracing::info;

use crate::domain::{
    calculate_house_health, HomecueError, HouseHealthScore, NewTask, Result, Task, TaskId,
    TaskStatus, TaskUpdate, UserId,
};
use crate::ports::{Clock, TaskStore};

pub struct TaskService {
    store: Arc<dyn TaskStore>,
    clock: Arc<dyn Clock>,
}

impl TaskService {
    pub fn new(store: Arc<dyn TaskStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub async fn create(&self, task: NewTask) -> Result<Task> {
        let task = self.store.insert_task(task).await?;
        info!(task_id = %task.id, user_id = %task.user_id, "task created");
        Ok(task)
    }

    pub async fn get(&self, id: TaskId) -> Result<Task> {
        self.store
            .get_task(id)
            .await?
            .ok_or(HomecueError::TaskNotFound(id))
    }

    /// Move a task to `status`.
    ///
    /// Setting the status a task already has is a no-op. Anything
    /// `TaskStatus::can_transition_to` forbids is `InvalidTransition`.
    pub async fn set_status(&self, id: TaskId, status: TaskStatus) -> Result<Task> {
        let task = self.get(id).await?;
        if task.status == status {
            return Ok(task);
        }
        if !task.status.can_transition_to(status) {
            return Err(HomecueError::InvalidTransition {
                id,
                from: task.status,
                to: status,
            });
        }

        let updated = self
            .store
            .update_task(id, TaskUpdate::status(status))
            .await?
            .ok_or(HomecueError::TaskNotFound(id))?;
        info!(task_id = %id, from = %task.status, to = %status, "task status changed");
        Ok(updated)
    }

    /// Completed goes back to pending; pending and overdue become completed.
    pub async fn toggle_completion(&self, id: TaskId) -> Result<Task> {
        let task = self.get(id).await?;
        self.set_status(id, task.status.toggled()).await
    }

    pub async fn delete_task(&self, id: TaskId) -> Result<bool> {
        let deleted = self.store.delete_task(id).await?;
        if deleted {
            info!(task_id = %id, "task deleted");
        }
        Ok(deleted)
    }

    /// Open tasks due at any point of the current local day.
    pub async fn tasks_due_today(&self, user_id: UserId) -> Result<Vec<Task>> {
        let start = self.clock.start_of_today();
        let end = self.clock.start_of_tomorrow();
        let mut tasks: Vec<Task> = self
            .store
            .list_by_user(user_id)
            .await?
            .into_iter()
            .filter(|t| t.status.is_open() && start <= t.due_date && t.due_date < end)
            .collect();
        tasks.sort_by_key(|t| t.due_date);
        Ok(tasks)
    }

    /// Open tasks due between now and `days` days from now, soonest first.
    pub async fn upcoming_tasks(&self, user_id: UserId, days: u32) -> Result<Vec<Task>> {
        let now = self.clock.now();
        let end = TimeDelta::try_days(i64::from(days))
            .and_then(|window| now.checked_add_signed(window))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let mut tasks: Vec<Task> = self
            .store
            .list_by_user(user_id)
            .await?
            .into_iter()
            .filter(|t| t.status.is_open() && now <= t.due_date && t.due_date <= end)
            .collect();
        tasks.sort_by_key(|t| t.due_date);
        Ok(tasks)
    }

    pub async fn house_health(&self, user_id: UserId) -> Result<HouseHealthScore> {
        let tasks = self.store.list_by_user(user_id).await?;
        Ok(calculate_house_health(user_id, &tasks, self.clock.now()))
    }
}
