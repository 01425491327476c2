//! JSON snapshot of users and tasks, used to seed and persist the in-memory store.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::{Result, Task, User};

use super::inmem_store::{InMemoryTaskStore, InMemoryUserDirectory};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl Snapshot {
    /// Read a snapshot file. A missing file is an empty snapshot.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Write atomically (temp file + rename).
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_string_pretty(self)?)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }

    pub fn into_stores(self) -> (InMemoryTaskStore, InMemoryUserDirectory) {
        (
            InMemoryTaskStore::from_tasks(self.tasks),
            InMemoryUserDirectory::from_users(self.users),
        )
    }

    pub async fn capture(store: &InMemoryTaskStore, users: &InMemoryUserDirectory) -> Self {
        Self {
            users: users.users().await,
            tasks: store.all_tasks().await,
        }
    }
}
