//! ReminderNotifier - リマインダー時刻が近いタスクのメール送信
//!
//! # フロー
//! 1. Mailer 未設定なら何もしない（ストアにも問い合わせない）
//! 2. [now, now + lookahead] にリマインダー時刻がある pending タスクを取得
//! 3. 所有者のメールアドレスを引き、1 タスク 1 通送る
//!
//! 送信済みの記録は持たない。窓に入っている間は毎回送られる。

use std::sync::Arc;

use chrono::{DateTime, Datelike, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::config::{MailConfig, SchedulerConfig};
use crate::domain::{Task, TaskStatus};
use crate::ports::{Clock, EmailMessage, Mailer, TaskStore, UserDirectory};

/// Outcome of one reminder run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderReport {
    /// Tasks found in the window.
    pub matched: usize,
    pub sent: usize,
    /// No address on file, or the lookup failed.
    pub skipped: usize,
    /// The mailer rejected the message.
    pub failed: usize,
}

pub struct ReminderNotifier {
    store: Arc<dyn TaskStore>,
    users: Arc<dyn UserDirectory>,
    mailer: Arc<dyn Mailer>,
    clock: Arc<dyn Clock>,
    lookahead: TimeDelta,
    from: String,
    app_url: String,
}

impl ReminderNotifier {
    /// A notifier with the default one-hour window and sender.
    pub fn new(
        store: Arc<dyn TaskStore>,
        users: Arc<dyn UserDirectory>,
        mailer: Arc<dyn Mailer>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            users,
            mailer,
            clock,
            lookahead: SchedulerConfig::default().reminder_lookahead(),
            from: MailConfig::default().from,
            app_url: MailConfig::default().app_url,
        }
    }

    pub fn with_settings(mut self, scheduler: &SchedulerConfig, mail: &MailConfig) -> Self {
        self.lookahead = scheduler.reminder_lookahead();
        self.from = mail.from.clone();
        self.app_url = mail.app_url.clone();
        self
    }

    /// Whether reminders can be sent at all.
    pub fn is_enabled(&self) -> bool {
        self.mailer.is_configured()
    }

    pub async fn process_task_reminders(&self) -> ReminderReport {
        let mut report = ReminderReport::default();
        if !self.is_enabled() {
            debug!("mailer not configured, skipping reminders");
            return report;
        }

        let start = self.clock.now();
        let end = start
            .checked_add_signed(self.lookahead)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let due = match self
            .store
            .list_by_status_with_reminder_between(TaskStatus::Pending, start, end)
            .await
        {
            Ok(tasks) => tasks,
            Err(e) => {
                error!(error = %e, kind = ?e.kind(), "failed to list tasks due for reminder");
                return report;
            }
        };
        report.matched = due.len();

        for task in &due {
            let to = match self.users.email_for(task.user_id).await {
                Ok(Some(to)) => to,
                Ok(None) => {
                    warn!(task_id = %task.id, user_id = %task.user_id, "no email on file, reminder skipped");
                    report.skipped += 1;
                    continue;
                }
                Err(e) => {
                    warn!(task_id = %task.id, error = %e, "user lookup failed, reminder skipped");
                    report.skipped += 1;
                    continue;
                }
            };

            let message = self.compose(task, to);
            match self.mailer.send(&message).await {
                Ok(()) => {
                    debug!(task_id = %task.id, "sent reminder");
                    report.sent += 1;
                }
                Err(e) => {
                    warn!(task_id = %task.id, error = %e, "failed to send reminder");
                    report.failed += 1;
                }
            }
        }

        if report.matched > 0 {
            info!(
                matched = report.matched,
                sent = report.sent,
                skipped = report.skipped,
                failed = report.failed,
                "processed task reminders"
            );
        }
        report
    }

    fn compose(&self, task: &Task, to: String) -> EmailMessage {
        let due = long_date(task.due_date);
        let priority = task.priority.as_str().to_uppercase();
        let description = task
            .description
            .as_deref()
            .filter(|d| !d.is_empty())
            .unwrap_or("No description provided");

        let text = format!(
            "Don't forget about your task \"{title}\" that is due on {due}.\n\n\
             Description: {description}\n\n\
             Priority: {priority}\n\n\
             Log in to homecue to mark it as complete or reschedule.",
            title = task.title,
        );

        let description_html = task
            .description
            .as_deref()
            .filter(|d| !d.is_empty())
            .map(|d| format!("<p><strong>Description:</strong> {}</p>", escape_html(d)))
            .unwrap_or_default();
        let html = format!(
            r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
  <div style="background-color: #16a1bd; padding: 20px; text-align: center;">
    <h1 style="color: white; margin: 0;">Task Reminder</h1>
  </div>
  <div style="padding: 20px; border: 1px solid #ddd; border-top: none;">
    <p>Don't forget about your task:</p>
    <h2 style="color: #16a1bd;">{title}</h2>
    <p><strong>Due date:</strong> {due}</p>
    <p><strong>Priority:</strong> {priority}</p>
    {description_html}
    <div style="margin-top: 30px; text-align: center;">
      <a href="{app_url}" style="background-color: #16a1bd; color: white; padding: 10px 20px; text-decoration: none; border-radius: 4px;">View Task</a>
    </div>
  </div>
  <div style="text-align: center; padding: 10px; color: #666; font-size: 12px;">
    <p>You received this email because you have an upcoming task in homecue.</p>
  </div>
</div>"#,
            title = escape_html(&task.title),
            app_url = escape_html(&self.app_url),
        );

        EmailMessage {
            to,
            from: self.from.clone(),
            subject: format!("Reminder: Task \"{}\" is due soon", task.title),
            text,
            html,
        }
    }
}

/// "June 1st, 2024".
fn long_date(at: DateTime<Utc>) -> String {
    let day = at.day();
    let suffix = match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{} {day}{suffix}, {}", at.format("%B"), at.year())
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
