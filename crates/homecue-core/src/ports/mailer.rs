//! Mailer port - トランザクションメール送信

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::Result;

/// One outgoing e-mail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailMessage {
    pub to: String,
    pub from: String,
    pub subject: String,
    pub text: String,
    pub html: String,
}

/// Mailer は外部のメール API を隠蔽
///
/// 資格情報がない場合は `is_configured()` が false を返し、
/// リマインダー関連の処理はすべて no-op になる。
#[async_trait]
pub trait Mailer: Send + Sync {
    fn is_configured(&self) -> bool;

    async fn send(&self, message: &EmailMessage) -> Result<()>;
}
