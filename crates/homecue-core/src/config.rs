//! Configuration for the scheduler, the mailer and the CLI's task snapshot.
//!
//! Loaded from TOML; every field has a default, so an empty file (or no
//! file at all) is a valid configuration. Secrets come from the environment.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::{HomecueError, Result};

const SENDGRID_API_KEY_VAR: &str = "SENDGRID_API_KEY";
const MAIL_FROM_VAR: &str = "HOMECUE_MAIL_FROM";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HomecueConfig {
    pub scheduler: SchedulerConfig,
    pub mail: MailConfig,
    pub store: StoreConfig,
}

/// Job intervals, in seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub recurrence_interval_secs: u64,
    pub overdue_interval_secs: u64,
    pub reminder_interval_secs: u64,
    /// How far ahead of now the reminder job looks.
    pub reminder_lookahead_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            recurrence_interval_secs: 24 * 60 * 60,
            overdue_interval_secs: 60 * 60,
            reminder_interval_secs: 60 * 60,
            reminder_lookahead_secs: 60 * 60,
        }
    }
}

impl SchedulerConfig {
    pub fn recurrence_interval(&self) -> Duration {
        Duration::from_secs(self.recurrence_interval_secs)
    }

    pub fn overdue_interval(&self) -> Duration {
        Duration::from_secs(self.overdue_interval_secs)
    }

    pub fn reminder_interval(&self) -> Duration {
        Duration::from_secs(self.reminder_interval_secs)
    }

    pub fn reminder_lookahead(&self) -> chrono::TimeDelta {
        i64::try_from(self.reminder_lookahead_secs)
            .ok()
            .and_then(chrono::TimeDelta::try_seconds)
            .unwrap_or(chrono::TimeDelta::MAX)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    /// SendGrid API key. Usually left out of the file and taken from
    /// `SENDGRID_API_KEY`.
    pub api_key: Option<String>,
    pub from: String,
    pub base_url: String,
    pub timeout_secs: u64,
    /// Link target of the "View Task" button.
    pub app_url: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            from: "notifications@homecue.app".to_string(),
            base_url: "https://api.sendgrid.com".to_string(),
            timeout_secs: 10,
            app_url: "https://homecue.app".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub snapshot_path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            snapshot_path: PathBuf::from("homecue.json"),
        }
    }
}

impl HomecueConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| HomecueError::Config(e.to_string()))
    }

    /// `from_file` if the file exists, defaults otherwise.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::from_file(path)
        } else {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Overlay values from the process environment.
    pub fn with_env(self) -> Self {
        self.with_env_from(|key| std::env::var(key).ok())
    }

    pub fn with_env_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(key) = lookup(SENDGRID_API_KEY_VAR).filter(|k| !k.trim().is_empty()) {
            self.mail.api_key = Some(key);
        }
        if let Some(from) = lookup(MAIL_FROM_VAR).filter(|f| !f.trim().is_empty()) {
            self.mail.from = from;
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        let s = &self.scheduler;
        for (name, secs) in [
            ("recurrence_interval_secs", s.recurrence_interval_secs),
            ("overdue_interval_secs", s.overdue_interval_secs),
            ("reminder_interval_secs", s.reminder_interval_secs),
        ] {
            if secs == 0 {
                return Err(HomecueError::Config(format!("scheduler.{name} must be > 0")));
            }
        }
        if self.mail.from.trim().is_empty() {
            return Err(HomecueError::Config("mail.from must not be empty".into()));
        }
        if self.mail.timeout_secs == 0 {
            return Err(HomecueError::Config("mail.timeout_secs must be > 0".into()));
        }
        Ok(())
    }
}
