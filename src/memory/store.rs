//! File-backed memory store.
//!
//! Every mutation is a load → modify → save cycle under the store's mutex,
//! so concurrent callers inside one process never lose updates. Separate
//! processes sharing a data directory are not coordinated.

use std::path::{Path, PathBuf};

use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::config::CorruptStatePolicy;
use crate::error::StoreError;
use crate::memory::model::{Memory, RecentEmail};
use crate::workspace::{JsonRead, quarantine, read_json, write_json_atomic};

pub struct MemoryStore {
    path: PathBuf,
    recent_limit: usize,
    policy: CorruptStatePolicy,
    lock: Mutex<()>,
}

impl MemoryStore {
    pub fn new(path: impl Into<PathBuf>, recent_limit: usize, policy: CorruptStatePolicy) -> Self {
        Self {
            path: path.into(),
            recent_limit,
            policy,
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the record. A missing file is created with the default record;
    /// a corrupt file is an error.
    pub async fn load(&self) -> Result<Memory, StoreError> {
        let _guard = self.lock.lock().await;
        self.load_unlocked().await
    }

    /// Load the record, replacing a corrupt file with the default record.
    ///
    /// The corrupt file is kept next to the original as
    /// `memory.json.corrupt-<timestamp>`.
    pub async fn load_or_reset(&self) -> Result<Memory, StoreError> {
        let _guard = self.lock.lock().await;
        self.load_or_reset_unlocked().await
    }

    /// Load the record, handling corruption per the configured policy.
    pub async fn load_current(&self) -> Result<Memory, StoreError> {
        let _guard = self.lock.lock().await;
        self.load_with_policy().await
    }

    /// Overwrite the record.
    pub async fn save(&self, memory: &Memory) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        write_json_atomic(&self.path, memory).await
    }

    /// Remember a processed email, most recent first.
    pub async fn add_recent_email(&self, entry: RecentEmail) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let mut memory = self.load_with_policy().await?;
        debug!(email_id = %entry.email_id, "Recording recent email");
        memory.push_recent(entry, self.recent_limit);
        write_json_atomic(&self.path, &memory).await
    }

    /// Record a task id. Known ids are left alone.
    pub async fn add_task_index(&self, task_id: &str) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let mut memory = self.load_with_policy().await?;
        if memory.index_task(task_id) {
            write_json_atomic(&self.path, &memory).await?;
        }
        Ok(())
    }

    async fn load_with_policy(&self) -> Result<Memory, StoreError> {
        match self.policy {
            CorruptStatePolicy::Reset => self.load_or_reset_unlocked().await,
            CorruptStatePolicy::Fail => self.load_unlocked().await,
        }
    }

    async fn load_unlocked(&self) -> Result<Memory, StoreError> {
        match read_json(&self.path).await? {
            JsonRead::Found(memory) => Ok(memory),
            JsonRead::Missing => {
                let memory = Memory::default();
                write_json_atomic(&self.path, &memory).await?;
                Ok(memory)
            }
        }
    }

    async fn load_or_reset_unlocked(&self) -> Result<Memory, StoreError> {
        match self.load_unlocked().await {
            Err(StoreError::Corrupt { path, reason }) => {
                let backup = quarantine(&path).await?;
                warn!(
                    path = %path.display(),
                    backup = %backup.display(),
                    reason = %reason,
                    "Memory record corrupt, resetting to defaults"
                );
                let memory = Memory::default();
                write_json_atomic(&self.path, &memory).await?;
                Ok(memory)
            }
            other => other,
        }
    }
}
