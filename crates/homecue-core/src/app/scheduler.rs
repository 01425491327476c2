//! Scheduler - 3 つのジョブを定期実行する
//!
//! - 各ジョブは自分の tokio タスク + `tokio::time::interval` で動く
//! - 停止は `watch` チャネル。実行中のジョブは最後まで走らせる
//! - Mailer 未設定ならリマインダーのタイマーは登録しない

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::config::SchedulerConfig;

use super::overdue::OverdueMarker;
use super::recurrence::RecurrenceProcessor;
use super::reminders::{ReminderNotifier, ReminderReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Job {
    Recurrence,
    Overdue,
    Reminders,
}

impl Job {
    pub fn as_str(self) -> &'static str {
        match self {
            Job::Recurrence => "recurrence",
            Job::Overdue => "overdue",
            Job::Reminders => "reminders",
        }
    }
}

/// Results of one pass over every job.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickSummary {
    pub created: usize,
    pub marked_overdue: usize,
    pub reminders: ReminderReport,
}

/// Timer handles of a started scheduler.
/// - `shutdown_tx` に true を送るか drop するとタイマーが止まる
struct Timers {
    shutdown_tx: watch::Sender<bool>,
    joins: Vec<(Job, JoinHandle<()>)>,
}

pub struct Scheduler {
    recurrence: Arc<RecurrenceProcessor>,
    overdue: Arc<OverdueMarker>,
    reminders: Arc<ReminderNotifier>,
    config: SchedulerConfig,
    timers: Option<Timers>,
}

impl Scheduler {
    pub fn new(
        recurrence: RecurrenceProcessor,
        overdue: OverdueMarker,
        reminders: ReminderNotifier,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            recurrence: Arc::new(recurrence),
            overdue: Arc::new(overdue),
            reminders: Arc::new(reminders),
            config,
            timers: None,
        }
    }

    /// Start the timers. Each job runs once right away, then on its interval.
    ///
    /// Returns `false` (and does nothing) when already running. Must be called
    /// from inside a tokio runtime.
    pub fn start(&mut self) -> bool {
        if self.timers.is_some() {
            warn!("scheduler already running");
            return false;
        }

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let mut joins = Vec::with_capacity(3);

        let recurrence = Arc::clone(&self.recurrence);
        joins.push((
            Job::Recurrence,
            spawn_timer(
                Job::Recurrence,
                self.config.recurrence_interval(),
                shutdown_rx.clone(),
                move || {
                    let recurrence = Arc::clone(&recurrence);
                    async move {
                        recurrence.process_recurring_tasks().await;
                    }
                },
            ),
        ));

        let overdue = Arc::clone(&self.overdue);
        joins.push((
            Job::Overdue,
            spawn_timer(
                Job::Overdue,
                self.config.overdue_interval(),
                shutdown_rx.clone(),
                move || {
                    let overdue = Arc::clone(&overdue);
                    async move {
                        overdue.update_overdue_tasks().await;
                    }
                },
            ),
        ));

        if self.reminders.is_enabled() {
            let reminders = Arc::clone(&self.reminders);
            joins.push((
                Job::Reminders,
                spawn_timer(
                    Job::Reminders,
                    self.config.reminder_interval(),
                    shutdown_rx,
                    move || {
                        let reminders = Arc::clone(&reminders);
                        async move {
                            reminders.process_task_reminders().await;
                        }
                    },
                ),
            ));
        } else {
            info!("mailer not configured, reminder timer not registered");
        }

        info!(
            jobs = ?joins.iter().map(|(job, _)| job.as_str()).collect::<Vec<_>>(),
            "scheduler started"
        );
        self.timers = Some(Timers { shutdown_tx, joins });
        true
    }

    /// Signal every timer to stop. A job run already in progress finishes.
    ///
    /// Returns `false` when the scheduler was not running.
    pub fn stop(&mut self) -> bool {
        let Some(timers) = self.timers.take() else {
            return false;
        };
        // receivers may already be gone
        let _ = timers.shutdown_tx.send(true);
        info!("scheduler stopped");
        true
    }

    /// `stop`, then wait for every timer task to exit.
    pub async fn stop_and_join(&mut self) {
        let Some(timers) = self.timers.take() else {
            return;
        };
        let _ = timers.shutdown_tx.send(true);
        for (job, join) in timers.joins {
            if let Err(e) = join.await {
                error!(job = job.as_str(), error = %e, "timer task ended abnormally");
            }
        }
        info!("scheduler stopped");
    }

    pub fn is_running(&self) -> bool {
        self.timers.is_some()
    }

    /// Jobs with a registered timer.
    pub fn active_jobs(&self) -> Vec<Job> {
        self.timers
            .as_ref()
            .map(|t| t.joins.iter().map(|(job, _)| *job).collect())
            .unwrap_or_default()
    }

    /// Run every job once, in order: recurrence, overdue, reminders.
    pub async fn run_once(&self) -> TickSummary {
        let created = self.recurrence.process_recurring_tasks().await;
        let marked_overdue = self.overdue.update_overdue_tasks().await;
        let reminders = self.reminders.process_task_reminders().await;
        TickSummary {
            created,
            marked_overdue,
            reminders,
        }
    }
}

/// Spawn the loop for one job.
///
/// Each run is spawned on its own task so a panicking job only loses that
/// run, and the timer keeps ticking.
fn spawn_timer<F, Fut>(
    job: Job,
    period: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
    run: F,
) -> JoinHandle<()>
where
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                // a closed channel means the scheduler was dropped
                _ = shutdown_rx.changed() => break,
                _ = interval.tick() => {}
            }
            if *shutdown_rx.borrow() {
                break;
            }

            debug!(job = job.as_str(), "job run starting");
            if let Err(e) = tokio::spawn(run()).await {
                error!(job = job.as_str(), error = %e, "job run panicked");
            }
        }
        debug!(job = job.as_str(), "timer exited");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Frequency, NewTask, Priority, TaskId, TaskStatus, User, UserId};
    use crate::impls::{DisabledMailer, InMemoryTaskStore, InMemoryUserDirectory};
    use crate::ports::{FixedClock, Mailer, TaskStore};
    use crate::test_support::{FlakyStore, RecordingMailer};
    use chrono::{TimeDelta, TimeZone, Utc};

    fn fast_config() -> SchedulerConfig {
        SchedulerConfig {
            recurrence_interval_secs: 3600,
            overdue_interval_secs: 3600,
            reminder_interval_secs: 3600,
            reminder_lookahead_secs: 3600,
        }
    }

    fn scheduler(store: Arc<dyn TaskStore>, mailer: Arc<dyn Mailer>) -> Scheduler {
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap(),
        ));
        let users = Arc::new(InMemoryUserDirectory::from_users(vec![User {
            id: UserId::new(1),
            email: Some("owner@example.com".into()),
            name: None,
        }]));
        Scheduler::new(
            RecurrenceProcessor::new(store.clone()),
            OverdueMarker::new(store.clone(), clock.clone()),
            ReminderNotifier::new(store, users, mailer, clock),
            fast_config(),
        )
    }

    async fn seed(store: &InMemoryTaskStore) {
        let day = |d| Utc.with_ymd_and_hms(2024, 6, d, 0, 0, 0).unwrap();
        // rolls over to 2024-06-08, which is before "today" and goes overdue
        store
            .insert_task(
                NewTask::new("Mow lawn", UserId::new(1), day(1), Frequency::Weekly, Priority::Low)
                    .recurring()
                    .status(TaskStatus::Completed),
            )
            .await
            .unwrap();
        store
            .insert_task(
                NewTask::new("Call plumber", UserId::new(1), day(20), Frequency::Annual, Priority::High)
                    .reminder_at(Utc.with_ymd_and_hms(2024, 6, 15, 12, 30, 0).unwrap()),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn run_once_runs_jobs_in_order() {
        let store = Arc::new(InMemoryTaskStore::new());
        seed(&store).await;
        let mailer = Arc::new(RecordingMailer::default());

        let summary = scheduler(store.clone(), mailer.clone()).run_once().await;
        assert_eq!(summary.created, 1);
        assert_eq!(summary.marked_overdue, 1);
        assert_eq!(summary.reminders.sent, 1);

        let next = store.get_task(TaskId::new(3)).await.unwrap().unwrap();
        assert_eq!(next.status, TaskStatus::Overdue);
        assert_eq!(mailer.sent().len(), 1);
    }

    #[tokio::test]
    async fn start_runs_each_job_immediately() {
        let store = Arc::new(InMemoryTaskStore::new());
        seed(&store).await;
        let mailer = Arc::new(RecordingMailer::default());
        let mut scheduler = scheduler(store.clone(), mailer.clone());

        assert!(scheduler.start());
        assert!(scheduler.is_running());
        assert_eq!(
            scheduler.active_jobs(),
            vec![Job::Recurrence, Job::Overdue, Job::Reminders]
        );

        // first ticks fire at once; give the spawned runs a moment
        for _ in 0..50 {
            if store.len().await == 3 && !mailer.sent().is_empty() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert_eq!(store.len().await, 3);
        assert_eq!(mailer.sent().len(), 1);

        scheduler.stop_and_join().await;
        assert!(!scheduler.is_running());
    }

    #[tokio::test]
    async fn second_start_is_ignored() {
        let store = Arc::new(InMemoryTaskStore::new());
        let mut scheduler = scheduler(store, Arc::new(RecordingMailer::default()));

        assert!(scheduler.start());
        assert!(!scheduler.start());
        assert_eq!(scheduler.active_jobs().len(), 3);
        scheduler.stop_and_join().await;
    }

    #[tokio::test]
    async fn reminder_timer_needs_a_configured_mailer() {
        let store = Arc::new(InMemoryTaskStore::new());
        let mut scheduler = scheduler(store, Arc::new(DisabledMailer));

        scheduler.start();
        assert_eq!(scheduler.active_jobs(), vec![Job::Recurrence, Job::Overdue]);
        scheduler.stop_and_join().await;
    }

    #[tokio::test]
    async fn stop_without_start_is_safe() {
        let store = Arc::new(InMemoryTaskStore::new());
        let mut scheduler = scheduler(store, Arc::new(DisabledMailer));

        assert!(!scheduler.stop());
        scheduler.stop_and_join().await;
        assert!(!scheduler.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn no_runs_after_stop() {
        let store = Arc::new(InMemoryTaskStore::new());
        let mailer = Arc::new(RecordingMailer::default());
        let mut scheduler = scheduler(store.clone(), mailer.clone());

        scheduler.start();
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        scheduler.stop_and_join().await;

        // a reminder that enters the window later is never sent
        store
            .insert_task(
                NewTask::new(
                    "Check smoke alarms",
                    UserId::new(1),
                    Utc.with_ymd_and_hms(2024, 6, 16, 0, 0, 0).unwrap(),
                    Frequency::Monthly,
                    Priority::Medium,
                )
                .reminder_at(Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap() + TimeDelta::minutes(5)),
            )
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_secs(2 * 3600)).await;
        assert!(mailer.sent().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn hung_job_does_not_hold_up_the_others() {
        let store = Arc::new(FlakyStore::new(InMemoryTaskStore::new()).hang_recurring_listing());
        let mut scheduler = scheduler(store.clone(), Arc::new(DisabledMailer));

        scheduler.start();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(store.recurring_listings(), 1);
        assert_eq!(store.overdue_sweeps(), 1);

        store
            .insert_task(NewTask::new(
                "Clean dryer vent",
                UserId::new(1),
                Utc.with_ymd_and_hms(2024, 6, 10, 0, 0, 0).unwrap(),
                Frequency::Monthly,
                Priority::High,
            ))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_secs(2 * 3600)).await;

        // recurrence is still stuck in its first run; overdue kept its ticks
        assert_eq!(store.recurring_listings(), 1);
        assert_eq!(store.overdue_sweeps(), 3);
        let task = store.get_task(TaskId::new(1)).await.unwrap().unwrap();
        assert_eq!(task.status, TaskStatus::Overdue);

        // join would wait for the hung run, so only signal
        assert!(scheduler.stop());
        tokio::time::sleep(Duration::from_secs(2 * 3600)).await;
        assert_eq!(store.overdue_sweeps(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn panicking_job_keeps_its_timer() {
        let store = Arc::new(FlakyStore::new(InMemoryTaskStore::new()).panic_on_recurring_listing());
        let mut scheduler = scheduler(store.clone(), Arc::new(DisabledMailer));

        scheduler.start();
        tokio::time::sleep(Duration::from_secs(2 * 3600 + 1)).await;
        assert_eq!(store.recurring_listings(), 3);
        assert_eq!(store.overdue_sweeps(), 3);

        scheduler.stop_and_join().await;
        assert!(!scheduler.is_running());
    }

    #[tokio::test]
    async fn restart_after_stop() {
        let store = Arc::new(InMemoryTaskStore::new());
        let mut scheduler = scheduler(store, Arc::new(DisabledMailer));

        assert!(scheduler.start());
        assert!(scheduler.stop());
        assert!(scheduler.start());
        scheduler.stop_and_join().await;
    }
}
