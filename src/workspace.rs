//! File-backed data directory for the memory record and the task list.
//!
//! The workspace is a directory on disk containing:
//! - `memory.json`: user profile, recent emails, known task ids
//! - `tasks.json`: the append-only task list
//!
//! Reads distinguish a missing file from a corrupt one. Writes go to a
//! sibling temp file which is then renamed over the target, so readers never
//! observe a half-written record.
//!
//! Only one process may own a workspace at a time. Stores built on top of it
//! serialize their own read-modify-write cycles, but nothing coordinates
//! separate processes.

use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::error::StoreError;

/// Well-known workspace file names.
pub mod paths {
    pub const MEMORY: &str = "memory.json";
    pub const TASKS: &str = "tasks.json";
}

/// Outcome of reading a JSON record that may not exist yet.
#[derive(Debug)]
pub enum JsonRead<T> {
    Found(T),
    Missing,
}

/// Read and parse a JSON file.
///
/// Returns `Missing` when the file does not exist, `Err(Corrupt)` when it
/// exists but does not parse as `T`.
pub async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<JsonRead<T>, StoreError> {
    let raw = match fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(JsonRead::Missing),
        Err(e) => return Err(StoreError::io(path, e)),
    };
    serde_json::from_str(&raw)
        .map(JsonRead::Found)
        .map_err(|e| StoreError::Corrupt {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}

/// Serialize `value` as pretty JSON and atomically replace `path` with it.
pub async fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| StoreError::io(parent, e))?;
    }
    let payload = serde_json::to_string_pretty(value)?;
    let temp_path = temp_path_for(path);
    let mut file = fs::File::create(&temp_path)
        .await
        .map_err(|e| StoreError::io(&temp_path, e))?;
    file.write_all(payload.as_bytes())
        .await
        .map_err(|e| StoreError::io(&temp_path, e))?;
    // Contents must be on disk before the rename makes them visible.
    file.sync_all()
        .await
        .map_err(|e| StoreError::io(&temp_path, e))?;
    drop(file);
    fs::rename(&temp_path, path)
        .await
        .map_err(|e| StoreError::io(path, e))
}

/// Move a corrupt file out of the way, returning where it went.
pub async fn quarantine(path: &Path) -> Result<PathBuf, StoreError> {
    let stamp = Utc::now().format("%Y%m%dT%H%M%S%.3f");
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "record".to_string());
    let dest = path.with_file_name(format!("{file_name}.corrupt-{stamp}"));
    fs::rename(path, &dest)
        .await
        .map_err(|e| StoreError::io(path, e))?;
    Ok(dest)
}

fn temp_path_for(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "record".to_string());
    path.with_file_name(format!("{file_name}.tmp"))
}

/// Data directory rooted at `base_path`.
#[derive(Debug, Clone)]
pub struct Workspace {
    base_path: PathBuf,
}

impl Workspace {
    /// Create a new workspace rooted at `base_path`.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Root directory.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Resolve a relative workspace path to an absolute path.
    pub fn resolve_path(&self, relative: &str) -> PathBuf {
        self.base_path.join(relative)
    }

    /// Ensure the workspace directory exists.
    pub async fn ensure_dirs(&self) -> Result<(), StoreError> {
        fs::create_dir_all(&self.base_path)
            .await
            .map_err(|e| StoreError::io(&self.base_path, e))
    }

    /// Path of the memory record.
    pub fn memory_path(&self) -> PathBuf {
        self.resolve_path(paths::MEMORY)
    }

    /// Path of the task list.
    pub fn tasks_path(&self) -> PathBuf {
        self.resolve_path(paths::TASKS)
    }
}
