//! Errors - エラー型と分類

use thiserror::Error;

use super::ids::TaskId;
use super::state::TaskStatus;

/// ErrorKind は運用上の分類
///
/// - Transient: 一時的（次の tick で自然にリトライされる）
/// - Permanent: 恒久的（入力や状態遷移が不正）
/// - Infrastructure: ストア・メール API・ファイルなど外部の障害
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transient,
    Permanent,
    Infrastructure,
}

#[derive(Debug, Error)]
pub enum HomecueError {
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    #[error("invalid status transition for {id}: {from} -> {to}")]
    InvalidTransition {
        id: TaskId,
        from: TaskStatus,
        to: TaskStatus,
    },

    #[error("unknown frequency: {0}")]
    UnknownFrequency(String),

    #[error("unknown status: {0}")]
    UnknownStatus(String),

    #[error("unknown priority: {0}")]
    UnknownPriority(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("mail error: {0}")]
    Mail(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl HomecueError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            HomecueError::TaskNotFound(_)
            | HomecueError::InvalidTransition { .. }
            | HomecueError::UnknownFrequency(_)
            | HomecueError::UnknownStatus(_)
            | HomecueError::UnknownPriority(_)
            | HomecueError::Config(_) => ErrorKind::Permanent,
            HomecueError::Http(e) if e.is_timeout() || e.is_connect() => ErrorKind::Transient,
            HomecueError::Storage(_)
            | HomecueError::Mail(_)
            | HomecueError::Io(_)
            | HomecueError::Json(_)
            | HomecueError::Http(_) => ErrorKind::Infrastructure,
        }
    }
}

pub type Result<T> = std::result::Result<T, HomecueError>;
