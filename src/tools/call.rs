//! Tool call and result types.
//!
//! Inside the crate a tool call is the closed [`ToolCall`] enum. Callers
//! outside it (an orchestrator replaying `{name, args}` JSON) go through
//! [`RawToolCall::parse`], the only place tool names are matched as strings.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::pipeline::types::{Priority, Recommendation};

/// A request to perform one side effect.
///
/// Serialized as `{"name": "...", "args": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", content = "args", rename_all = "snake_case")]
pub enum ToolCall {
    /// Persist a task, overriding the action's priority when set.
    CreateTask {
        #[serde(default)]
        priority: Option<Priority>,
    },
    /// Persist a task due at `start`.
    ScheduleEvent { start: String },
    /// Draft a reply asking the sender to confirm a slot.
    ComposeReply {
        #[serde(default)]
        preferred_slot: Option<String>,
    },
}

impl ToolCall {
    /// Every tool name, in definition order.
    pub const NAMES: [&'static str; 3] = ["create_task", "schedule_event", "compose_reply"];

    pub fn name(&self) -> &'static str {
        match self {
            Self::CreateTask { .. } => "create_task",
            Self::ScheduleEvent { .. } => "schedule_event",
            Self::ComposeReply { .. } => "compose_reply",
        }
    }

    pub fn recommendation(&self) -> Recommendation {
        match self {
            Self::CreateTask { .. } => Recommendation::CreateTask,
            Self::ScheduleEvent { .. } => Recommendation::ScheduleEvent,
            Self::ComposeReply { .. } => Recommendation::ComposeReply,
        }
    }
}

/// Errors turning an untyped call into a [`ToolCall`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ToolCallError {
    #[error("Unknown tool {0}")]
    UnknownTool(String),

    #[error("Invalid arguments for {name}: {message}")]
    InvalidArguments { name: String, message: String },
}

/// An untyped tool call as received from outside the crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawToolCall {
    pub name: String,
    #[serde(default)]
    pub args: Value,
}

impl RawToolCall {
    pub fn new(name: impl Into<String>, args: Value) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }

    /// Validate the name and arguments.
    pub fn parse(&self) -> Result<ToolCall, ToolCallError> {
        if !ToolCall::NAMES.contains(&self.name.as_str()) {
            return Err(ToolCallError::UnknownTool(self.name.clone()));
        }
        let args = if self.args.is_null() {
            Value::Object(Default::default())
        } else {
            self.args.clone()
        };
        serde_json::from_value(serde_json::json!({ "name": self.name, "args": args })).map_err(
            |e| ToolCallError::InvalidArguments {
                name: self.name.clone(),
                message: e.to_string(),
            },
        )
    }
}

/// Payload of a successful tool call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ToolOutput {
    TaskCreated { task_id: String, message: String },
    Reply { reply_text: String },
}

/// Outcome of a tool call, serialized with a `status` field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ToolResult {
    Ok(ToolOutput),
    Error { message: String },
    Noop { message: String },
}

impl ToolResult {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    pub fn noop(message: impl Into<String>) -> Self {
        Self::Noop {
            message: message.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok(_))
    }

    /// Id of the task this call created, if any.
    pub fn task_id(&self) -> Option<&str> {
        match self {
            Self::Ok(ToolOutput::TaskCreated { task_id, .. }) => Some(task_id),
            _ => None,
        }
    }
}

/// Tool descriptor for registration with an external orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON schema of `args`.
    pub parameters: Value,
}
