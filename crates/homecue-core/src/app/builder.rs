//! AppBuilder - アプリケーションの構築とワイヤリング
//!
//! - ports の実装を受け取り、ジョブ・Scheduler・TaskService を組み立てる
//! - 起動時検証（Fail-fast）: 設定が不正なら build() がエラーを返す

use std::sync::Arc;

use crate::config::HomecueConfig;
use crate::domain::HomecueError;
use crate::impls::mailer_from_config;
use crate::ports::{Clock, Mailer, SystemClock, TaskStore, UserDirectory};

use super::overdue::OverdueMarker;
use super::recurrence::RecurrenceProcessor;
use super::reminders::ReminderNotifier;
use super::scheduler::Scheduler;
use super::tasks::TaskService;

/// AppBuilder はアプリケーションを構築
///
/// # 使用例
/// ```ignore
/// let app = AppBuilder::new(store, users)
///     .config(config)
///     .build()?;
/// ```
///
/// Mailer を渡さなければ `config.mail` から作る（API キーがなければ無効）。
pub struct AppBuilder {
    store: Arc<dyn TaskStore>,
    users: Arc<dyn UserDirectory>,
    mailer: Option<Arc<dyn Mailer>>,
    clock: Arc<dyn Clock>,
    config: HomecueConfig,
}

/// BuildError はアプリケーション構築時のエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(#[source] HomecueError),

    #[error("cannot create mailer: {0}")]
    Mailer(#[source] HomecueError),
}

impl AppBuilder {
    pub fn new(store: Arc<dyn TaskStore>, users: Arc<dyn UserDirectory>) -> Self {
        Self {
            store,
            users,
            mailer: None,
            clock: Arc::new(SystemClock),
            config: HomecueConfig::default(),
        }
    }

    pub fn mailer(mut self, mailer: Arc<dyn Mailer>) -> Self {
        self.mailer = Some(mailer);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(mut self, config: HomecueConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<App, BuildError> {
        self.config.validate().map_err(BuildError::InvalidConfig)?;

        let mailer = match self.mailer {
            Some(mailer) => mailer,
            None => mailer_from_config(&self.config.mail).map_err(BuildError::Mailer)?,
        };

        let recurrence = RecurrenceProcessor::new(Arc::clone(&self.store));
        let overdue = OverdueMarker::new(Arc::clone(&self.store), Arc::clone(&self.clock));
        let reminders = ReminderNotifier::new(
            Arc::clone(&self.store),
            self.users,
            mailer,
            Arc::clone(&self.clock),
        )
        .with_settings(&self.config.scheduler, &self.config.mail);

        Ok(App {
            scheduler: Scheduler::new(recurrence, overdue, reminders, self.config.scheduler),
            tasks: TaskService::new(self.store, self.clock),
        })
    }
}

/// App は組み立て済みのアプリケーション
pub struct App {
    pub scheduler: Scheduler,
    pub tasks: TaskService,
}
