//! RecurrenceProcessor - 完了済み繰り返しタスクの次回分を生成
//!
//! # フロー
//! 1. status=completed かつ is_recurring=true のタスクを取得
//! 2. 次回分（pending, 繰り返し有効）を挿入
//! 3. 挿入に成功した元タスクのみ is_recurring=false に落とす
//!
//! 挿入と降格はトランザクションではない。降格に失敗すると次回の実行で
//! もう一度ロールオーバーされる（at-least-once）。

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::domain::{Task, TaskStatus, TaskUpdate};
use crate::ports::TaskStore;

pub struct RecurrenceProcessor {
    store: Arc<dyn TaskStore>,
}

impl RecurrenceProcessor {
    pub fn new(store: Arc<dyn TaskStore>) -> Self {
        Self { store }
    }

    /// Roll every completed recurring task over to its next occurrence.
    ///
    /// Returns how many new tasks were created. Never fails: a failed listing
    /// counts as zero, a failed task is logged and skipped.
    pub async fn process_recurring_tasks(&self) -> usize {
        let eligible: Vec<Task> = match self
            .store
            .list_by_status_and_recurring(TaskStatus::Completed, true)
            .await
        {
            // a listing may be stale by the time we see it
            Ok(tasks) => tasks.into_iter().filter(Task::is_rollover_eligible).collect(),
            Err(e) => {
                error!(error = %e, kind = ?e.kind(), "failed to list completed recurring tasks");
                return 0;
            }
        };

        let mut created = 0;
        for task in &eligible {
            if self.roll_over(task).await {
                created += 1;
            }
        }

        if created > 0 {
            info!(created, eligible = eligible.len(), "created recurring task occurrences");
        }
        created
    }

    /// `true` when the next occurrence was inserted.
    async fn roll_over(&self, task: &Task) -> bool {
        let next = match self.store.insert_task(task.next_occurrence()).await {
            Ok(next) => next,
            Err(e) => {
                warn!(task_id = %task.id, error = %e, "failed to create next occurrence");
                return false;
            }
        };
        debug!(
            task_id = %task.id,
            next_id = %next.id,
            due_date = %next.due_date,
            frequency = %task.frequency,
            "rolled over recurring task"
        );

        match self
            .store
            .update_task(task.id, TaskUpdate::recurring(false))
            .await
        {
            Ok(Some(_)) => {}
            Ok(None) => debug!(task_id = %task.id, "task removed before it could be demoted"),
            Err(e) => warn!(
                task_id = %task.id,
                error = %e,
                "failed to clear recurring flag; task will roll over again"
            ),
        }
        true
    }
}
