//! Ports - 抽象化レイヤー
//!
//! Hexagonal Architecture の「ポート」です。各 trait は外部システム
//! （RDB、ユーザー管理、メール API、時計）へのインターフェースを提供します。
//! ジョブは `Arc<dyn Trait>` だけに依存し、実装は `impls` に置きます。

pub mod clock;
pub mod mailer;
pub mod task_store;
pub mod user_directory;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::mailer::{EmailMessage, Mailer};
pub use self::task_store::TaskStore;
pub use self::user_directory::UserDirectory;
