//! Test doubles shared by the job tests.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    HomecueError, NewTask, Result, Task, TaskId, TaskStatus, TaskUpdate, UserId,
};
use crate::impls::InMemoryTaskStore;
use crate::ports::{EmailMessage, Mailer, TaskStore};

/// What `list_by_status_and_recurring` does besides delegating.
#[derive(Clone, Copy, PartialEq, Eq)]
enum RecurringListing {
    Normal,
    /// Returns every task, ignoring the filter.
    Unfiltered,
    /// Never completes.
    Hang,
    Panic,
}

/// Wraps the in-memory store and fails selected operations.
pub(crate) struct FlakyStore {
    pub inner: InMemoryTaskStore,
    fail_listing: bool,
    fail_insert_titles: HashSet<String>,
    fail_update_ids: HashSet<TaskId>,
    recurring_listing: RecurringListing,
    recurring_listings: AtomicUsize,
    overdue_sweeps: AtomicUsize,
}

impl FlakyStore {
    pub fn new(inner: InMemoryTaskStore) -> Self {
        Self {
            inner,
            fail_listing: false,
            fail_insert_titles: HashSet::new(),
            fail_update_ids: HashSet::new(),
            recurring_listing: RecurringListing::Normal,
            recurring_listings: AtomicUsize::new(0),
            overdue_sweeps: AtomicUsize::new(0),
        }
    }

    pub fn fail_listing(mut self) -> Self {
        self.fail_listing = true;
        self
    }

    pub fn fail_insert_for(mut self, title: &str) -> Self {
        self.fail_insert_titles.insert(title.to_string());
        self
    }

    pub fn fail_update_for(mut self, id: TaskId) -> Self {
        self.fail_update_ids.insert(id);
        self
    }

    pub fn unfiltered_recurring_listing(mut self) -> Self {
        self.recurring_listing = RecurringListing::Unfiltered;
        self
    }

    pub fn hang_recurring_listing(mut self) -> Self {
        self.recurring_listing = RecurringListing::Hang;
        self
    }

    pub fn panic_on_recurring_listing(mut self) -> Self {
        self.recurring_listing = RecurringListing::Panic;
        self
    }

    /// Calls to `list_by_status_and_recurring` so far.
    pub fn recurring_listings(&self) -> usize {
        self.recurring_listings.load(Ordering::SeqCst)
    }

    /// Calls to `mark_overdue_before` so far.
    pub fn overdue_sweeps(&self) -> usize {
        self.overdue_sweeps.load(Ordering::SeqCst)
    }

    fn unavailable() -> HomecueError {
        HomecueError::Storage("store unavailable".into())
    }
}

#[async_trait]
impl TaskStore for FlakyStore {
    async fn insert_task(&self, task: NewTask) -> Result<Task> {
        if self.fail_insert_titles.contains(&task.title) {
            return Err(Self::unavailable());
        }
        self.inner.insert_task(task).await
    }

    async fn get_task(&self, id: TaskId) -> Result<Option<Task>> {
        self.inner.get_task(id).await
    }

    async fn update_task(&self, id: TaskId, update: TaskUpdate) -> Result<Option<Task>> {
        if self.fail_update_ids.contains(&id) {
            return Err(Self::unavailable());
        }
        self.inner.update_task(id, update).await
    }

    async fn delete_task(&self, id: TaskId) -> Result<bool> {
        self.inner.delete_task(id).await
    }

    async fn list_by_user(&self, user_id: UserId) -> Result<Vec<Task>> {
        if self.fail_listing {
            return Err(Self::unavailable());
        }
        self.inner.list_by_user(user_id).await
    }

    async fn list_by_status_and_recurring(
        &self,
        status: TaskStatus,
        is_recurring: bool,
    ) -> Result<Vec<Task>> {
        self.recurring_listings.fetch_add(1, Ordering::SeqCst);
        if self.fail_listing {
            return Err(Self::unavailable());
        }
        match self.recurring_listing {
            RecurringListing::Normal => {
                self.inner.list_by_status_and_recurring(status, is_recurring).await
            }
            RecurringListing::Unfiltered => Ok(self.inner.all_tasks().await),
            RecurringListing::Hang => std::future::pending().await,
            RecurringListing::Panic => panic!("recurring listing blew up"),
        }
    }

    async fn list_by_status_with_reminder_between(
        &self,
        status: TaskStatus,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Task>> {
        if self.fail_listing {
            return Err(Self::unavailable());
        }
        self.inner
            .list_by_status_with_reminder_between(status, start, end)
            .await
    }

    async fn mark_overdue_before(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        self.overdue_sweeps.fetch_add(1, Ordering::SeqCst);
        if self.fail_listing {
            return Err(Self::unavailable());
        }
        self.inner.mark_overdue_before(cutoff).await
    }
}

/// Records every message instead of sending it.
#[derive(Default)]
pub(crate) struct RecordingMailer {
    sent: Mutex<Vec<EmailMessage>>,
    fail_to: HashSet<String>,
}

impl RecordingMailer {
    pub fn failing_for(to: &str) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail_to: HashSet::from([to.to_string()]),
        }
    }

    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    fn is_configured(&self) -> bool {
        true
    }

    async fn send(&self, message: &EmailMessage) -> Result<()> {
        if self.fail_to.contains(&message.to) {
            return Err(HomecueError::Mail("rejected".into()));
        }
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}
