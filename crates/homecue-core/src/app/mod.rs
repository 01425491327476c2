//! App - アプリケーション層
//!
//! このモジュールは、ports を組み合わせてアプリケーションロジックを実装します。
//!
//! # 主要コンポーネント
//! - **AppBuilder**: アプリケーションの構築とワイヤリング
//! - **RecurrenceProcessor**: 完了済み繰り返しタスクの次回分生成
//! - **OverdueMarker**: 期限切れタスクの overdue 化
//! - **ReminderNotifier**: リマインダーメール送信
//! - **Scheduler**: 上記 3 ジョブの定期実行
//! - **TaskService**: ユーザー操作（状態変更・一覧・家の健康スコア）

pub mod builder;
pub mod overdue;
pub mod recurrence;
pub mod reminders;
pub mod scheduler;
pub mod tasks;

// 主要な型を再エクスポート
pub use self::builder::{App, AppBuilder, BuildError};
pub use self::overdue::OverdueMarker;
pub use self::recurrence::RecurrenceProcessor;
pub use self::reminders::{ReminderNotifier, ReminderReport};
pub use self::scheduler::{Job, Scheduler, TickSummary};
pub use self::tasks::TaskService;
