//! TaskStore port - タスクの正本（source of truth）
//!
//! バッチジョブとユーザー操作はすべてこの trait 経由で同じタスク表を読み書きします。
//! 本番では RDB、テストと CLI では `InMemoryTaskStore` が実装します。

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{NewTask, Result, Task, TaskId, TaskStatus, TaskUpdate, UserId};

/// TaskStore は状態の正本
///
/// # 設計原則
/// - 一括更新（`mark_overdue_before`）は `WHERE status = pending` 相当の集合演算で行う
/// - 行ロックやトランザクションは要求しない（ジョブ側は at-least-once を許容）
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Insert a task and return it with its assigned id.
    async fn insert_task(&self, task: NewTask) -> Result<Task>;

    async fn get_task(&self, id: TaskId) -> Result<Option<Task>>;

    /// Apply a partial update. `Ok(None)` when the id does not exist.
    async fn update_task(&self, id: TaskId, update: TaskUpdate) -> Result<Option<Task>>;

    /// Remove a task. Returns whether it existed.
    async fn delete_task(&self, id: TaskId) -> Result<bool>;

    async fn list_by_user(&self, user_id: UserId) -> Result<Vec<Task>>;

    async fn list_by_status_and_recurring(
        &self,
        status: TaskStatus,
        is_recurring: bool,
    ) -> Result<Vec<Task>>;

    /// Tasks in `status` whose reminder falls in `[start, end]` (inclusive).
    async fn list_by_status_with_reminder_between(
        &self,
        status: TaskStatus,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Task>>;

    /// Set every pending task due strictly before `cutoff` to overdue.
    /// Returns the number of tasks changed.
    async fn mark_overdue_before(&self, cutoff: DateTime<Utc>) -> Result<usize>;
}
