//! OverdueMarker - 期限切れの pending タスクを overdue にする
//!
//! 「期限切れ」は due_date が今日の 0 時（Clock の基準）より前であること。
//! 今日が期限のタスクは対象外。

use std::sync::Arc;

use tracing::{error, info};

use crate::ports::{Clock, TaskStore};

pub struct OverdueMarker {
    store: Arc<dyn TaskStore>,
    clock: Arc<dyn Clock>,
}

impl OverdueMarker {
    pub fn new(store: Arc<dyn TaskStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Mark every pending task due before today as overdue.
    ///
    /// Returns the number of tasks changed; a store failure is logged and
    /// counts as zero.
    pub async fn update_overdue_tasks(&self) -> usize {
        let today = self.clock.start_of_today();
        match self.store.mark_overdue_before(today).await {
            Ok(changed) => {
                if changed > 0 {
                    info!(changed, cutoff = %today, "marked tasks overdue");
                }
                changed
            }
            Err(e) => {
                error!(error = %e, kind = ?e.kind(), "failed to mark overdue tasks");
                0
            }
        }
    }
}
