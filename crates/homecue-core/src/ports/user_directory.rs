//! UserDirectory port - ユーザー管理側への問い合わせ

use async_trait::async_trait;

use crate::domain::{Result, UserId};

/// Resolves the address reminders are sent to.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// `Ok(None)` when the user is unknown or has no e-mail on file.
    async fn email_for(&self, user_id: UserId) -> Result<Option<String>>;
}
