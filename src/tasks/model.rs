//! Task data model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::pipeline::types::{Action, Priority, SourceEmail};

/// Lifecycle status. Tasks are created pending and never transitioned here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
}

/// A unit of committed follow-up work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// `t-` followed by 8 hex characters, unique within the list.
    pub task_id: String,
    pub title: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    /// First date of the originating action, if any.
    pub due: Option<String>,
    #[serde(default)]
    pub status: TaskStatus,
    pub source_email_id: String,
    #[serde(default)]
    pub priority: Priority,
    /// The originating action type.
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Task {
    /// Build a pending task for `action`, originating from `source`.
    pub fn from_action(task_id: impl Into<String>, action: &Action, source: &SourceEmail) -> Self {
        Self {
            task_id: task_id.into(),
            title: action.title.clone(),
            description: action.description.clone(),
            created_at: Utc::now(),
            due: action.dates.first().cloned(),
            status: TaskStatus::Pending,
            source_email_id: source.email_id.clone(),
            priority: action.priority.unwrap_or_default(),
            tags: vec![action.action_type.as_str().to_string()],
        }
    }

    /// Calendar date portion of `due`.
    pub fn due_date(&self) -> Option<&str> {
        self.due.as_deref().map(date_portion)
    }
}

/// Date part of an ISO-8601 string: everything before `T`.
pub fn date_portion(iso: &str) -> &str {
    iso.split('T').next().unwrap_or(iso)
}

/// The on-disk task list: `{"tasks": [...]}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskList {
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl TaskList {
    pub fn contains(&self, task_id: &str) -> bool {
        self.tasks.iter().any(|t| t.task_id == task_id)
    }
}

/// Result of persisting a new task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskCreated {
    pub task_id: String,
    pub message: String,
}
