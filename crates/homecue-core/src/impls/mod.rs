//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **InMemoryTaskStore / InMemoryUserDirectory**: CLI とテスト用の正本
//! - **Snapshot**: 上記を JSON ファイルから復元・保存
//! - **SendGridMailer**: 本番用のメール送信
//! - **DisabledMailer**: API キー未設定時の no-op

pub mod inmem_store;
pub mod mail;
pub mod snapshot;

pub use self::inmem_store::{InMemoryTaskStore, InMemoryUserDirectory};
pub use self::mail::{mailer_from_config, DisabledMailer, SendGridMailer};
pub use self::snapshot::Snapshot;
