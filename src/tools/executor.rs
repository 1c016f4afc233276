//! Tool dispatch.
//!
//! Tool calls never fail the pipeline: store failures, unknown names and
//! bad arguments are reported as [`ToolResult::Error`].

use std::sync::Arc;

use serde_json::json;
use tracing::{debug, error, warn};

use crate::pipeline::types::{Action, SourceEmail};
use crate::tasks::TaskStore;
use crate::tools::call::{RawToolCall, ToolCall, ToolDefinition, ToolOutput, ToolResult};

const GENERIC_SLOT_QUESTION: &str = "which of these slots works for you?";

/// Applies tool calls against the task store.
pub struct ToolExecutor {
    tasks: Arc<TaskStore>,
}

impl ToolExecutor {
    pub fn new(tasks: Arc<TaskStore>) -> Self {
        Self { tasks }
    }

    /// Run `call` for `action`, which originated from `source`.
    pub async fn execute(
        &self,
        call: Option<&ToolCall>,
        action: &Action,
        source: &SourceEmail,
    ) -> ToolResult {
        let Some(call) = call else {
            return ToolResult::noop("No tool call provided");
        };
        debug!(tool = call.name(), action_id = %action.id, "Executing tool");

        match call {
            ToolCall::CreateTask { priority } => {
                let mut action = action.clone();
                if let Some(priority) = priority {
                    action.priority = Some(*priority);
                }
                self.create_task(&action, source).await
            }
            ToolCall::ScheduleEvent { start } => {
                let mut action = action.clone();
                action.dates = vec![start.clone()];
                self.create_task(&action, source).await
            }
            ToolCall::ComposeReply { preferred_slot } => ToolResult::Ok(ToolOutput::Reply {
                reply_text: compose_reply_text(action, preferred_slot.as_deref()),
            }),
        }
    }

    /// Run an untyped call from outside the crate.
    pub async fn execute_raw(
        &self,
        call: Option<&RawToolCall>,
        action: &Action,
        source: &SourceEmail,
    ) -> ToolResult {
        let Some(raw) = call else {
            return self.execute(None, action, source).await;
        };
        match raw.parse() {
            Ok(call) => self.execute(Some(&call), action, source).await,
            Err(e) => {
                warn!(tool = %raw.name, error = %e, "Rejected tool call");
                ToolResult::error(e.to_string())
            }
        }
    }

    /// Descriptors for every tool, for registration with an orchestrator.
    pub fn definitions() -> Vec<ToolDefinition> {
        vec![
            ToolDefinition {
                name: "create_task".into(),
                description: "Persist a follow-up task for the action. The task is due on \
                              the action's first date and tagged with its type."
                    .into(),
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "priority": {
                            "type": ["string", "null"],
                            "enum": ["high", "medium", "low", null],
                            "description": "Overrides the action's priority (default: action priority, else medium)"
                        }
                    }
                }),
            },
            ToolDefinition {
                name: "schedule_event".into(),
                description: "Record a scheduled event as a task due at the given start time."
                    .into(),
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "start": {
                            "type": "string",
                            "description": "ISO-8601 start, e.g. 2025-05-01T14:00:00"
                        }
                    },
                    "required": ["start"]
                }),
            },
            ToolDefinition {
                name: "compose_reply".into(),
                description: "Draft a reply asking the sender to confirm a time slot. \
                              Nothing is sent or stored."
                    .into(),
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "preferred_slot": {
                            "type": ["string", "null"],
                            "description": "Slot to propose; omitted asks which slot works"
                        }
                    }
                }),
            },
        ]
    }

    async fn create_task(&self, action: &Action, source: &SourceEmail) -> ToolResult {
        match self.tasks.create_task(action, source).await {
            Ok(created) => ToolResult::Ok(ToolOutput::TaskCreated {
                task_id: created.task_id,
                message: created.message,
            }),
            Err(e) => {
                error!(action_id = %action.id, error = %e, "Task creation failed");
                ToolResult::error(e.to_string())
            }
        }
    }
}

/// Reply asking the first contact (or "there") to confirm a slot.
pub fn compose_reply_text(action: &Action, preferred_slot: Option<&str>) -> String {
    let name = action
        .contacts
        .first()
        .map(|c| c.name.as_str())
        .filter(|n| !n.is_empty())
        .unwrap_or("there");
    let slot = preferred_slot.unwrap_or(GENERIC_SLOT_QUESTION);
    format!("Hi {name}, thanks, could you confirm: {slot}")
}
