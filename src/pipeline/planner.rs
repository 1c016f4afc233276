//! Rule-based planner.
//!
//! Maps each extracted action to at most one tool call. Rules are checked in
//! order, first match wins:
//! 1. Invoice or currency amount in the description → create a high-priority task
//! 2. Schedule with dates → schedule the first timed date, or ask for a slot
//!    when it clashes with an existing task or no time was given
//! 3. Task → create a task
//! 4. Delegate with contacts → compose a reply
//! 5. Anything else → ignore

use tracing::debug;

use crate::error::PipelineError;
use crate::memory::Memory;
use crate::pipeline::heuristics::{extract_amounts, infer_priority};
use crate::pipeline::types::{Action, ActionType, ExtractorOutput, Plan, PlanOutput, Priority};
use crate::tasks::TaskReader;
use crate::tasks::model::date_portion;
use crate::tools::ToolCall;

/// Confidence assigned by each rule, tagged with a version.
#[derive(Debug, Clone, PartialEq)]
pub struct Ruleset {
    pub version: u32,
    pub invoice_with_amounts: f32,
    pub invoice: f32,
    pub schedule_exact: f32,
    pub schedule_conflict: f32,
    pub schedule_ambiguous: f32,
    pub task: f32,
    pub delegate: f32,
    pub fallback: f32,
}

impl Ruleset {
    /// Version 2, the current ruleset.
    pub fn refined() -> Self {
        Self {
            version: 2,
            invoice_with_amounts: 0.97,
            invoice: 0.90,
            schedule_exact: 0.92,
            schedule_conflict: 0.6,
            schedule_ambiguous: 0.7,
            task: 0.8,
            delegate: 0.85,
            fallback: 0.55,
        }
    }
}

impl Default for Ruleset {
    fn default() -> Self {
        Self::refined()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Planner {
    ruleset: Ruleset,
}

impl Planner {
    pub fn new(ruleset: Ruleset) -> Self {
        Self { ruleset }
    }

    pub fn ruleset(&self) -> &Ruleset {
        &self.ruleset
    }

    /// Plan every action of one email.
    ///
    /// `memory` is available to rules but the current ruleset does not
    /// consult it. Only a failed task store read is an error.
    pub async fn plan(
        &self,
        output: &ExtractorOutput,
        memory: &Memory,
        tasks: &dyn TaskReader,
    ) -> Result<PlanOutput, PipelineError> {
        debug!(
            email_id = %output.email_id,
            actions = output.actions.len(),
            known_tasks = memory.tasks_index.len(),
            ruleset = self.ruleset.version,
            "Planning"
        );
        let mut plans = Vec::with_capacity(output.actions.len());
        for action in &output.actions {
            plans.push(self.plan_action(action, tasks).await?);
        }
        Ok(PlanOutput {
            email_id: output.email_id.clone(),
            ruleset: self.ruleset.version,
            plans,
        })
    }

    /// Plan a single action.
    pub async fn plan_action(
        &self,
        action: &Action,
        tasks: &dyn TaskReader,
    ) -> Result<Plan, PipelineError> {
        let rules = &self.ruleset;
        let plan = |confidence: f32, reason: String, tool_call: Option<ToolCall>| Plan {
            action_id: action.id.clone(),
            confidence,
            reason,
            tool_call,
        };

        let amounts = extract_amounts(&action.description);
        if action.action_type == ActionType::Invoice || !amounts.is_empty() {
            debug!(action_id = %action.id, amounts = ?amounts, "Rule matched: invoice");
            let (confidence, reason) = if amounts.is_empty() {
                (rules.invoice, "Invoice-like content".to_string())
            } else {
                (
                    rules.invoice_with_amounts,
                    format!("Invoice/amount detected: {}", amounts.join(", ")),
                )
            };
            let call = ToolCall::CreateTask {
                priority: Some(Priority::High),
            };
            return Ok(plan(confidence, reason, Some(call)));
        }

        if action.action_type == ActionType::Schedule && !action.dates.is_empty() {
            let Some(chosen) = action.timed_dates().next() else {
                debug!(action_id = %action.id, "Rule matched: schedule without time");
                return Ok(plan(
                    rules.schedule_ambiguous,
                    "Ambiguous date; will ask user to confirm".into(),
                    Some(ToolCall::ComposeReply {
                        preferred_slot: None,
                    }),
                ));
            };

            if has_conflict(chosen, tasks).await? {
                debug!(action_id = %action.id, start = chosen, "Rule matched: schedule conflict");
                return Ok(plan(
                    rules.schedule_conflict,
                    "Conflict detected with existing scheduled item".into(),
                    Some(ToolCall::ComposeReply {
                        preferred_slot: None,
                    }),
                ));
            }

            debug!(action_id = %action.id, start = chosen, "Rule matched: schedule");
            return Ok(plan(
                rules.schedule_exact,
                "Exact time present".into(),
                Some(ToolCall::ScheduleEvent {
                    start: chosen.to_string(),
                }),
            ));
        }

        if action.action_type == ActionType::Task {
            let priority = action
                .priority
                .unwrap_or_else(|| infer_priority(&action.description));
            debug!(action_id = %action.id, priority = %priority, "Rule matched: task");
            return Ok(plan(
                rules.task,
                "Generic task detected".into(),
                Some(ToolCall::CreateTask {
                    priority: Some(priority),
                }),
            ));
        }

        if action.action_type == ActionType::Delegate && !action.contacts.is_empty() {
            debug!(action_id = %action.id, "Rule matched: delegate");
            return Ok(plan(
                rules.delegate,
                "Delegation action; compose reply".into(),
                Some(ToolCall::ComposeReply {
                    preferred_slot: None,
                }),
            ));
        }

        debug!(action_id = %action.id, "No rule matched");
        Ok(plan(rules.fallback, "No clear action".into(), None))
    }
}

/// Whether any persisted task is due on the same calendar day as `start`.
async fn has_conflict(start: &str, tasks: &dyn TaskReader) -> Result<bool, PipelineError> {
    let day = date_portion(start);
    let due = tasks.due_dates().await.map_err(PipelineError::Planning)?;
    Ok(due.iter().any(|d| date_portion(d) == day))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::pipeline::types::{Contact, Recommendation};
    use async_trait::async_trait;
    use std::path::PathBuf;

    struct FixedTasks(Vec<&'static str>);

    #[async_trait]
    impl TaskReader for FixedTasks {
        async fn due_dates(&self) -> Result<Vec<String>, StoreError> {
            Ok(self.0.iter().map(|d| d.to_string()).collect())
        }
    }

    struct BrokenTasks;

    #[async_trait]
    impl TaskReader for BrokenTasks {
        async fn due_dates(&self) -> Result<Vec<String>, StoreError> {
            Err(StoreError::Corrupt {
                path: PathBuf::from("tasks.json"),
                reason: "expected value".into(),
            })
        }
    }

    fn action(action_type: ActionType, description: &str, dates: &[&str]) -> Action {
        Action {
            id: "a-1".into(),
            action_type,
            title: "t".into(),
            description: description.into(),
            dates: dates.iter().map(|d| d.to_string()).collect(),
            contacts: vec![],
            priority: None,
            confidence: 0.9,
        }
    }

    async fn plan_one(action: Action, tasks: &dyn TaskReader) -> Plan {
        Planner::default().plan_action(&action, tasks).await.unwrap()
    }

    #[tokio::test]
    async fn invoice_with_amount() {
        let plan = plan_one(
            action(ActionType::Invoice, "Please pay $150 or 150 INR", &[]),
            &FixedTasks(vec![]),
        )
        .await;
        assert_eq!(plan.recommendation(), Recommendation::CreateTask);
        assert_eq!(plan.confidence, 0.97);
        assert_eq!(plan.reason, "Invoice/amount detected: $150, 150 INR");
        assert_eq!(
            plan.tool_call,
            Some(ToolCall::CreateTask {
                priority: Some(Priority::High)
            })
        );
    }

    #[tokio::test]
    async fn invoice_without_amount() {
        let plan = plan_one(
            action(ActionType::Invoice, "see attached", &[]),
            &FixedTasks(vec![]),
        )
        .await;
        assert_eq!(plan.confidence, 0.90);
        assert_eq!(plan.reason, "Invoice-like content");
    }

    #[tokio::test]
    async fn amount_outranks_schedule() {
        let plan = plan_one(
            action(ActionType::Schedule, "Lunch costs €20", &["2025-05-01T12:00:00"]),
            &FixedTasks(vec![]),
        )
        .await;
        assert_eq!(plan.recommendation(), Recommendation::CreateTask);
        assert_eq!(plan.confidence, 0.97);
    }

    #[tokio::test]
    async fn schedule_exact_time() {
        let plan = plan_one(
            action(
                ActionType::Schedule,
                "sync",
                &["2025-05-01", "2025-05-01T14:00:00", "2025-05-02T09:00:00"],
            ),
            &FixedTasks(vec!["2025-04-30T14:00:00"]),
        )
        .await;
        assert_eq!(plan.confidence, 0.92);
        assert_eq!(
            plan.tool_call,
            Some(ToolCall::ScheduleEvent {
                start: "2025-05-01T14:00:00".into()
            })
        );
    }

    #[tokio::test]
    async fn schedule_conflict_on_same_day() {
        let plan = plan_one(
            action(ActionType::Schedule, "sync", &["2025-05-01T14:00:00"]),
            &FixedTasks(vec!["2025-05-01T10:00:00"]),
        )
        .await;
        assert_eq!(plan.recommendation(), Recommendation::ComposeReply);
        assert_eq!(plan.confidence, 0.6);
        assert_eq!(plan.reason, "Conflict detected with existing scheduled item");
    }

    #[tokio::test]
    async fn date_only_due_also_conflicts() {
        let plan = plan_one(
            action(ActionType::Schedule, "sync", &["2025-05-01T14:00:00"]),
            &FixedTasks(vec!["2025-05-01"]),
        )
        .await;
        assert_eq!(plan.recommendation(), Recommendation::ComposeReply);
    }

    #[tokio::test]
    async fn schedule_without_time_asks() {
        let plan = plan_one(
            action(ActionType::Schedule, "sync", &["2025-05-01"]),
            &BrokenTasks,
        )
        .await;
        assert_eq!(plan.confidence, 0.7);
        assert_eq!(
            plan.tool_call,
            Some(ToolCall::ComposeReply {
                preferred_slot: None
            })
        );
    }

    #[tokio::test]
    async fn schedule_without_dates_is_ignored() {
        let plan = plan_one(action(ActionType::Schedule, "sync", &[]), &FixedTasks(vec![])).await;
        assert_eq!(plan.recommendation(), Recommendation::Ignore);
        assert_eq!(plan.confidence, 0.55);
    }

    #[tokio::test]
    async fn task_priority_inferred() {
        let plan = plan_one(
            action(ActionType::Task, "Urgent: send the deck", &[]),
            &FixedTasks(vec![]),
        )
        .await;
        assert_eq!(plan.confidence, 0.8);
        assert_eq!(
            plan.tool_call,
            Some(ToolCall::CreateTask {
                priority: Some(Priority::High)
            })
        );
    }

    #[tokio::test]
    async fn task_priority_from_action() {
        let mut task = action(ActionType::Task, "Urgent: send the deck", &[]);
        task.priority = Some(Priority::Low);
        let plan = plan_one(task, &FixedTasks(vec![])).await;
        assert_eq!(
            plan.tool_call,
            Some(ToolCall::CreateTask {
                priority: Some(Priority::Low)
            })
        );
    }

    #[tokio::test]
    async fn delegate_needs_contacts() {
        let mut delegate = action(ActionType::Delegate, "forward this", &[]);
        let plan = plan_one(delegate.clone(), &FixedTasks(vec![])).await;
        assert_eq!(plan.recommendation(), Recommendation::Ignore);

        delegate.contacts.push(Contact {
            name: "Ops".into(),
            email: "ops@example.com".into(),
        });
        let plan = plan_one(delegate, &FixedTasks(vec![])).await;
        assert_eq!(plan.recommendation(), Recommendation::ComposeReply);
        assert_eq!(plan.confidence, 0.85);
    }

    #[tokio::test]
    async fn task_store_failure_propagates() {
        let err = Planner::default()
            .plan_action(
                &action(ActionType::Schedule, "sync", &["2025-05-01T14:00:00"]),
                &BrokenTasks,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Planning(ref e) if e.is_corrupt()));
    }

    #[tokio::test]
    async fn plan_output_carries_ruleset_version() {
        let output = ExtractorOutput {
            email_id: "e-1".into(),
            summary_text: String::new(),
            summary_length: 0,
            actions: vec![action(ActionType::Info, "hello", &[])],
        };
        let planned = Planner::default()
            .plan(&output, &Memory::default(), &FixedTasks(vec![]))
            .await
            .unwrap();
        assert_eq!(planned.email_id, "e-1");
        assert_eq!(planned.ruleset, 2);
        assert_eq!(planned.plans.len(), 1);
        assert_eq!(planned.plans[0].action_id, "a-1");
    }
}
