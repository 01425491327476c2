//! homecue-core
//!
//! Background maintenance jobs for home-maintenance tasks: recurring task
//! rollover, overdue marking and e-mail reminders, plus the user-facing task
//! operations and the house-health score.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, task, state, frequency, health, errors）
//! - **ports**: 抽象化レイヤー（TaskStore, UserDirectory, Mailer, Clock）
//! - **app**: アプリケーションロジック（jobs, scheduler, task service, builder）
//! - **impls**: 実装（InMemoryTaskStore, SendGridMailer, Snapshot）
//! - **config**: TOML + 環境変数の設定

pub mod app;
pub mod config;
pub mod domain;
pub mod impls;
pub mod ports;

#[cfg(test)]
mod test_support;

pub use crate::config::HomecueConfig;
pub use crate::domain::{HomecueError, Result};
