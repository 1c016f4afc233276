//! File-backed task store.
//!
//! The task list is append-only. Like the memory store, read-modify-write
//! cycles are serialized behind a mutex; a data directory must be owned by a
//! single process.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::error::StoreError;
use crate::memory::MemoryStore;
use crate::pipeline::types::{Action, SourceEmail, short_id};
use crate::tasks::model::{Task, TaskCreated, TaskList};
use crate::workspace::{JsonRead, read_json, write_json_atomic};

/// Read access to persisted task due dates, used for conflict checks.
#[async_trait]
pub trait TaskReader: Send + Sync {
    /// `due` of every task that has one, as stored.
    async fn due_dates(&self) -> Result<Vec<String>, StoreError>;
}

pub struct TaskStore {
    path: PathBuf,
    memory: Arc<MemoryStore>,
    lock: Mutex<()>,
}

impl TaskStore {
    pub fn new(path: impl Into<PathBuf>, memory: Arc<MemoryStore>) -> Self {
        Self {
            path: path.into(),
            memory,
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create an empty task list if none exists. Existing files are untouched.
    pub async fn ensure(&self) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        self.ensure_unlocked().await
    }

    /// Read the full task list.
    pub async fn read(&self) -> Result<TaskList, StoreError> {
        let _guard = self.lock.lock().await;
        self.read_unlocked().await
    }

    /// Overwrite the task list.
    pub async fn write(&self, list: &TaskList) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        write_json_atomic(&self.path, list).await
    }

    /// Append a task for `action` and record its id in memory.
    ///
    /// Memory is checked before the list is touched, so an unusable memory
    /// record fails the call with nothing saved. Once the task is written the
    /// call succeeds; a failed index update after that point is only logged.
    pub async fn create_task(
        &self,
        action: &Action,
        source: &SourceEmail,
    ) -> Result<TaskCreated, StoreError> {
        self.memory.load_current().await?;

        let task = {
            let _guard = self.lock.lock().await;
            let mut list = self.read_unlocked().await?;
            let mut task_id = short_id("t");
            while list.contains(&task_id) {
                task_id = short_id("t");
            }
            let task = Task::from_action(task_id, action, source);
            list.tasks.push(task.clone());
            write_json_atomic(&self.path, &list).await?;
            task
        };

        if let Err(e) = self.memory.add_task_index(&task.task_id).await {
            warn!(task_id = %task.task_id, error = %e, "Task saved but not indexed in memory");
        }

        info!(
            task_id = %task.task_id,
            priority = %task.priority,
            due = task.due.as_deref().unwrap_or("-"),
            "Task created"
        );
        Ok(TaskCreated {
            task_id: task.task_id,
            message: "Task created".into(),
        })
    }

    async fn ensure_unlocked(&self) -> Result<(), StoreError> {
        let exists = tokio::fs::try_exists(&self.path)
            .await
            .map_err(|e| StoreError::io(&self.path, e))?;
        if !exists {
            write_json_atomic(&self.path, &TaskList::default()).await?;
        }
        Ok(())
    }

    async fn read_unlocked(&self) -> Result<TaskList, StoreError> {
        self.ensure_unlocked().await?;
        match read_json(&self.path).await? {
            JsonRead::Found(list) => Ok(list),
            JsonRead::Missing => Ok(TaskList::default()),
        }
    }
}

#[async_trait]
impl TaskReader for TaskStore {
    async fn due_dates(&self) -> Result<Vec<String>, StoreError> {
        let list = self.read().await?;
        Ok(list.tasks.into_iter().filter_map(|t| t.due).collect())
    }
}
