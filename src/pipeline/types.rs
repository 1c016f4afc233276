//! Shared types for the extraction → planning → action pipeline.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::tools::{ToolCall, ToolResult};

/// Generate a short prefixed identifier, e.g. `a-1f3c9e0b`.
pub fn short_id(prefix: &str) -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("{}-{}", prefix, &hex[..8])
}

// ── Inbound email ───────────────────────────────────────────────────

/// An email as supplied by the caller. Extra fields in the source are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmailInput {
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub body: String,
}

impl EmailInput {
    pub fn new(subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
        }
    }
}

/// The email a tool call originates from, as seen by the executor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceEmail {
    pub email_id: String,
    pub subject: String,
    pub body: String,
}

// ── Action ──────────────────────────────────────────────────────────

/// Classification of an email's actionable content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    Invoice,
    Schedule,
    Task,
    Delegate,
    Info,
}

impl ActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Invoice => "invoice",
            Self::Schedule => "schedule",
            Self::Task => "task",
            Self::Delegate => "delegate",
            Self::Info => "info",
        }
    }
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Urgency of an action or task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A person referenced by address in an email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub name: String,
    pub email: String,
}

/// One actionable unit inferred from an email.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
    pub id: String,
    #[serde(rename = "type")]
    pub action_type: ActionType,
    pub title: String,
    pub description: String,
    /// ISO-8601 strings in extraction order. Entries carrying a time of day
    /// contain the `T` separator.
    pub dates: Vec<String>,
    pub contacts: Vec<Contact>,
    pub priority: Option<Priority>,
    pub confidence: f32,
}

impl Action {
    /// Dates carrying an explicit time of day.
    pub fn timed_dates(&self) -> impl Iterator<Item = &str> {
        self.dates
            .iter()
            .map(String::as_str)
            .filter(|d| d.contains('T'))
    }
}

/// Extractor output for one email.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorOutput {
    pub email_id: String,
    pub summary_text: String,
    /// Word count of `summary_text`.
    pub summary_length: usize,
    pub actions: Vec<Action>,
}

// ── Plan ────────────────────────────────────────────────────────────

/// What the planner recommends for an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    CreateTask,
    ScheduleEvent,
    ComposeReply,
    Ignore,
}

impl Recommendation {
    pub fn label(&self) -> &'static str {
        match self {
            Self::CreateTask => "create_task",
            Self::ScheduleEvent => "schedule_event",
            Self::ComposeReply => "compose_reply",
            Self::Ignore => "ignore",
        }
    }
}

/// The planner's verdict for one action.
///
/// The recommendation is derived from the tool call, so a plan can never
/// recommend one tool while carrying another.
#[derive(Debug, Clone)]
pub struct Plan {
    pub action_id: String,
    pub confidence: f32,
    pub reason: String,
    pub tool_call: Option<ToolCall>,
}

impl Plan {
    pub fn recommendation(&self) -> Recommendation {
        self.tool_call
            .as_ref()
            .map_or(Recommendation::Ignore, ToolCall::recommendation)
    }
}

impl Serialize for Plan {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("Plan", 5)?;
        state.serialize_field("action_id", &self.action_id)?;
        state.serialize_field("recommendation", &self.recommendation())?;
        state.serialize_field("confidence", &self.confidence)?;
        state.serialize_field("reason", &self.reason)?;
        state.serialize_field("tool_call", &self.tool_call)?;
        state.end()
    }
}

/// Planner output for one email.
#[derive(Debug, Clone, Serialize)]
pub struct PlanOutput {
    pub email_id: String,
    /// Version of the ruleset that produced the plans.
    pub ruleset: u32,
    pub plans: Vec<Plan>,
}

// ── Report ──────────────────────────────────────────────────────────

/// Email header of a report entry.
#[derive(Debug, Clone, Serialize)]
pub struct ReportEmail {
    pub email_id: String,
    pub subject: String,
    pub summary: String,
}

/// One plan and what executing it produced.
#[derive(Debug, Clone, Serialize)]
pub struct ReportPlan {
    pub action_id: String,
    pub recommendation: Recommendation,
    pub confidence: f32,
    pub reason: String,
    pub tool_result: Option<ToolResult>,
}

/// Aggregated result of processing one email.
#[derive(Debug, Clone, Serialize)]
pub struct EmailReport {
    pub email: ReportEmail,
    pub plans: Vec<ReportPlan>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_id_shape() {
        let id = short_id("t");
        assert_eq!(id.len(), 10);
        assert!(id.starts_with("t-"));
        assert!(id[2..].chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(short_id("t"), short_id("t"));
    }

    #[test]
    fn action_type_serializes_as_type_field() {
        let action = Action {
            id: "a-1".into(),
            action_type: ActionType::Delegate,
            title: "t".into(),
            description: "d".into(),
            dates: vec![],
            contacts: vec![],
            priority: None,
            confidence: 0.9,
        };
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["type"], "delegate");
        assert!(json["priority"].is_null());
    }

    #[test]
    fn timed_dates_filters_on_separator() {
        let action = Action {
            id: "a-1".into(),
            action_type: ActionType::Schedule,
            title: "t".into(),
            description: String::new(),
            dates: vec![
                "2025-05-01".into(),
                "2025-05-02T09:00:00".into(),
                "2025-05-03T10:30:00".into(),
            ],
            contacts: vec![],
            priority: None,
            confidence: 0.9,
        };
        let timed: Vec<&str> = action.timed_dates().collect();
        assert_eq!(timed, vec!["2025-05-02T09:00:00", "2025-05-03T10:30:00"]);
    }

    #[test]
    fn plan_without_tool_call_is_ignore() {
        let plan = Plan {
            action_id: "a-1".into(),
            confidence: 0.55,
            reason: "No clear action".into(),
            tool_call: None,
        };
        assert_eq!(plan.recommendation(), Recommendation::Ignore);
        let json = serde_json::to_value(&plan).unwrap();
        assert_eq!(json["recommendation"], "ignore");
        assert!(json["tool_call"].is_null());
    }

    #[test]
    fn plan_recommendation_follows_tool_call() {
        let plan = Plan {
            action_id: "a-1".into(),
            confidence: 0.92,
            reason: "Exact time present".into(),
            tool_call: Some(ToolCall::ScheduleEvent {
                start: "2025-05-01T14:00:00".into(),
            }),
        };
        assert_eq!(plan.recommendation(), Recommendation::ScheduleEvent);
        let json = serde_json::to_value(&plan).unwrap();
        assert_eq!(json["recommendation"], "schedule_event");
        assert_eq!(json["tool_call"]["name"], "schedule_event");
        assert_eq!(json["tool_call"]["args"]["start"], "2025-05-01T14:00:00");
    }

    #[test]
    fn email_input_ignores_extra_fields() {
        let input: EmailInput =
            serde_json::from_str(r#"{"subject": "Hi", "from": "x@y.com"}"#).unwrap();
        assert_eq!(input.subject, "Hi");
        assert_eq!(input.body, "");
    }

    #[test]
    fn priority_default_is_medium() {
        assert_eq!(Priority::default(), Priority::Medium);
        assert_eq!(serde_json::to_string(&Priority::High).unwrap(), "\"high\"");
    }
}
