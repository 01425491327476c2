//! In-memory task store and user directory.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::domain::{NewTask, Result, Task, TaskId, TaskStatus, TaskUpdate, User, UserId};
use crate::ports::{TaskStore, UserDirectory};

/// In-memory store state.
///
/// `tasks` is keyed by id, so every listing comes back in insertion order.
struct InMemoryStoreState {
    tasks: BTreeMap<TaskId, Task>,

    /// Next task ID to assign.
    next_task_id: i64,
}

impl InMemoryStoreState {
    fn new() -> Self {
        Self {
            tasks: BTreeMap::new(),
            next_task_id: 1,
        }
    }

    fn allocate_task_id(&mut self) -> TaskId {
        let id = TaskId::new(self.next_task_id);
        self.next_task_id += 1;
        id
    }

    fn matching<F>(&self, pred: F) -> Vec<Task>
    where
        F: Fn(&Task) -> bool,
    {
        self.tasks.values().filter(|t| pred(t)).cloned().collect()
    }
}

/// In-memory `TaskStore`, used by the CLI and by tests.
pub struct InMemoryTaskStore {
    state: Arc<Mutex<InMemoryStoreState>>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(InMemoryStoreState::new())),
        }
    }

    /// Seed the store with existing tasks; ids are kept as they are.
    pub fn from_tasks(tasks: Vec<Task>) -> Self {
        let mut state = InMemoryStoreState::new();
        for task in tasks {
            state.next_task_id = state.next_task_id.max(task.id.get() + 1);
            state.tasks.insert(task.id, task);
        }
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Every task, ordered by id.
    pub async fn all_tasks(&self) -> Vec<Task> {
        let state = self.state.lock().await;
        state.tasks.values().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.tasks.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for InMemoryTaskStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn insert_task(&self, task: NewTask) -> Result<Task> {
        let mut state = self.state.lock().await;
        let id = state.allocate_task_id();
        let task = task.into_task(id, Utc::now());
        state.tasks.insert(id, task.clone());
        Ok(task)
    }

    async fn get_task(&self, id: TaskId) -> Result<Option<Task>> {
        let state = self.state.lock().await;
        Ok(state.tasks.get(&id).cloned())
    }

    async fn update_task(&self, id: TaskId, update: TaskUpdate) -> Result<Option<Task>> {
        let mut state = self.state.lock().await;
        let Some(task) = state.tasks.get_mut(&id) else {
            return Ok(None);
        };
        update.apply(task);
        Ok(Some(task.clone()))
    }

    async fn delete_task(&self, id: TaskId) -> Result<bool> {
        let mut state = self.state.lock().await;
        Ok(state.tasks.remove(&id).is_some())
    }

    async fn list_by_user(&self, user_id: UserId) -> Result<Vec<Task>> {
        let state = self.state.lock().await;
        Ok(state.matching(|t| t.user_id == user_id))
    }

    async fn list_by_status_and_recurring(
        &self,
        status: TaskStatus,
        is_recurring: bool,
    ) -> Result<Vec<Task>> {
        let state = self.state.lock().await;
        Ok(state.matching(|t| t.status == status && t.is_recurring == is_recurring))
    }

    async fn list_by_status_with_reminder_between(
        &self,
        status: TaskStatus,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Task>> {
        let state = self.state.lock().await;
        Ok(state.matching(|t| {
            t.status == status
                && t.reminder_time
                    .is_some_and(|reminder| start <= reminder && reminder <= end)
        }))
    }

    async fn mark_overdue_before(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        let mut state = self.state.lock().await;
        let mut changed = 0;
        for task in state.tasks.values_mut() {
            if task.status == TaskStatus::Pending && task.due_date < cutoff {
                task.status = TaskStatus::Overdue;
                changed += 1;
            }
        }
        Ok(changed)
    }
}

/// In-memory `UserDirectory`.
pub struct InMemoryUserDirectory {
    users: Mutex<HashMap<UserId, User>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::from_users(Vec::new())
    }

    pub fn from_users(users: Vec<User>) -> Self {
        Self {
            users: Mutex::new(users.into_iter().map(|u| (u.id, u)).collect()),
        }
    }

    pub async fn users(&self) -> Vec<User> {
        let users = self.users.lock().await;
        let mut list: Vec<User> = users.values().cloned().collect();
        list.sort_by_key(|u| u.id);
        list
    }
}

impl Default for InMemoryUserDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn email_for(&self, user_id: UserId) -> Result<Option<String>> {
        let users = self.users.lock().await;
        Ok(users
            .get(&user_id)
            .and_then(|u| u.email.clone())
            .filter(|email| !email.trim().is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Frequency, Priority};
    use chrono::{TimeDelta, TimeZone};

    fn due(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, day, 8, 0, 0).unwrap()
    }

    fn new_task(title: &str, day: u32) -> NewTask {
        NewTask::new(title, UserId::new(1), due(day), Frequency::Weekly, Priority::Low)
    }

    #[tokio::test]
    async fn insert_assigns_sequential_ids() {
        let store = InMemoryTaskStore::new();
        let a = store.insert_task(new_task("a", 1)).await.unwrap();
        let b = store.insert_task(new_task("b", 2)).await.unwrap();
        assert_eq!(a.id, TaskId::new(1));
        assert_eq!(b.id, TaskId::new(2));
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn seeded_store_continues_after_highest_id() {
        let seeded = new_task("old", 1).into_task(TaskId::new(41), due(1));
        let store = InMemoryTaskStore::from_tasks(vec![seeded]);
        let next = store.insert_task(new_task("new", 2)).await.unwrap();
        assert_eq!(next.id, TaskId::new(42));
    }

    #[tokio::test]
    async fn update_and_delete_missing_ids() {
        let store = InMemoryTaskStore::new();
        let missing = TaskId::new(99);
        assert!(
            store
                .update_task(missing, TaskUpdate::status(TaskStatus::Completed))
                .await
                .unwrap()
                .is_none()
        );
        assert!(!store.delete_task(missing).await.unwrap());
    }

    #[tokio::test]
    async fn reminder_window_is_inclusive() {
        let store = InMemoryTaskStore::new();
        let start = due(10);
        let end = start + TimeDelta::hours(1);

        for (title, reminder) in [
            ("at-start", start),
            ("at-end", end),
            ("before", start - TimeDelta::seconds(1)),
            ("after", end + TimeDelta::seconds(1)),
        ] {
            store
                .insert_task(new_task(title, 11).reminder_at(reminder))
                .await
                .unwrap();
        }
        store.insert_task(new_task("no-reminder", 11)).await.unwrap();

        let found = store
            .list_by_status_with_reminder_between(TaskStatus::Pending, start, end)
            .await
            .unwrap();
        let titles: Vec<_> = found.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["at-start", "at-end"]);
    }

    #[tokio::test]
    async fn mark_overdue_only_touches_pending() {
        let store = InMemoryTaskStore::new();
        store.insert_task(new_task("pending", 1)).await.unwrap();
        store
            .insert_task(new_task("done", 1).status(TaskStatus::Completed))
            .await
            .unwrap();
        store.insert_task(new_task("future", 20)).await.unwrap();

        let changed = store.mark_overdue_before(due(10)).await.unwrap();
        assert_eq!(changed, 1);

        let statuses: Vec<_> = store.all_tasks().await.iter().map(|t| t.status).collect();
        assert_eq!(
            statuses,
            vec![TaskStatus::Overdue, TaskStatus::Completed, TaskStatus::Pending]
        );
    }

    #[tokio::test]
    async fn user_directory_ignores_blank_emails() {
        let dir = InMemoryUserDirectory::from_users(vec![
            User {
                id: UserId::new(1),
                email: Some("a@example.com".into()),
                name: None,
            },
            User {
                id: UserId::new(2),
                email: Some("  ".into()),
                name: None,
            },
        ]);
        assert_eq!(
            dir.email_for(UserId::new(1)).await.unwrap().as_deref(),
            Some("a@example.com")
        );
        assert_eq!(dir.email_for(UserId::new(2)).await.unwrap(), None);
        assert_eq!(dir.email_for(UserId::new(3)).await.unwrap(), None);
    }
}
