//! Pipeline driver: extract → remember → plan → execute, one email at a time.
//!
//! Emails are processed strictly in sequence; a tool call never overlaps
//! another. In [`RunMode::Direct`] the planner is skipped and a fixed rule
//! decides which actions become tasks.

use std::sync::Arc;

use tracing::{debug, info};

use crate::config::{AppConfig, RunMode};
use crate::error::{PipelineError, StoreError};
use crate::memory::{MemoryStore, RecentEmail};
use crate::pipeline::extractor::Extractor;
use crate::pipeline::planner::Planner;
use crate::pipeline::types::{
    Action, ActionType, EmailInput, EmailReport, ExtractorOutput, Plan, ReportEmail, ReportPlan,
    SourceEmail,
};
use crate::tasks::TaskStore;
use crate::tools::{ToolCall, ToolExecutor};

pub struct Pipeline {
    extractor: Extractor,
    planner: Planner,
    memory: Arc<MemoryStore>,
    tasks: Arc<TaskStore>,
    executor: ToolExecutor,
    mode: RunMode,
}

impl Pipeline {
    pub fn new(
        extractor: Extractor,
        planner: Planner,
        memory: Arc<MemoryStore>,
        tasks: Arc<TaskStore>,
        mode: RunMode,
    ) -> Self {
        Self {
            extractor,
            planner,
            executor: ToolExecutor::new(Arc::clone(&tasks)),
            memory,
            tasks,
            mode,
        }
    }

    /// Build a pipeline over the configured data directory, creating the
    /// directory and an empty task list if needed.
    pub async fn from_config(config: &AppConfig) -> Result<Self, StoreError> {
        let workspace = config.workspace();
        workspace.ensure_dirs().await?;

        let memory = Arc::new(MemoryStore::new(
            workspace.memory_path(),
            config.recent_limit,
            config.on_corrupt,
        ));
        let tasks = Arc::new(TaskStore::new(workspace.tasks_path(), Arc::clone(&memory)));
        tasks.ensure().await?;

        info!(
            data_dir = %workspace.base_path().display(),
            mode = ?config.mode,
            "Pipeline ready"
        );
        Ok(Self::new(
            Extractor::default(),
            Planner::default(),
            memory,
            tasks,
            config.mode,
        ))
    }

    pub fn memory(&self) -> &Arc<MemoryStore> {
        &self.memory
    }

    pub fn tasks(&self) -> &Arc<TaskStore> {
        &self.tasks
    }

    /// Process one email end to end.
    pub async fn process(&self, email: &EmailInput) -> Result<EmailReport, PipelineError> {
        let output = self.extractor.extract(&email.subject, &email.body);
        info!(
            email_id = %output.email_id,
            subject = %email.subject,
            "Processing email"
        );

        self.memory
            .add_recent_email(RecentEmail {
                email_id: output.email_id.clone(),
                subject: email.subject.clone(),
                summary: output.summary_text.clone(),
            })
            .await
            .map_err(PipelineError::Memory)?;

        let plans = match self.mode {
            RunMode::Plan => {
                let memory = self
                    .memory
                    .load_current()
                    .await
                    .map_err(PipelineError::Memory)?;
                self.planner
                    .plan(&output, &memory, self.tasks.as_ref())
                    .await?
                    .plans
            }
            RunMode::Direct => output.actions.iter().map(direct_plan).collect(),
        };

        let source = SourceEmail {
            email_id: output.email_id.clone(),
            subject: email.subject.clone(),
            body: email.body.clone(),
        };
        let mut entries = Vec::with_capacity(plans.len());
        for plan in plans {
            entries.push(self.apply(plan, &output, &source).await);
        }

        Ok(EmailReport {
            email: ReportEmail {
                email_id: output.email_id,
                subject: email.subject.clone(),
                summary: output.summary_text,
            },
            plans: entries,
        })
    }

    /// Process emails in order, stopping at the first pipeline error.
    pub async fn run_batch(&self, emails: &[EmailInput]) -> Result<Vec<EmailReport>, PipelineError> {
        info!(count = emails.len(), "Processing email batch");
        let mut reports = Vec::with_capacity(emails.len());
        for email in emails {
            reports.push(self.process(email).await?);
        }
        let tasks_created = reports
            .iter()
            .flat_map(|r| &r.plans)
            .filter(|p| p.tool_result.as_ref().and_then(|r| r.task_id()).is_some())
            .count();
        info!(processed = reports.len(), tasks_created, "Batch complete");
        Ok(reports)
    }

    async fn apply(&self, plan: Plan, output: &ExtractorOutput, source: &SourceEmail) -> ReportPlan {
        let recommendation = plan.recommendation();
        let action = output.actions.iter().find(|a| a.id == plan.action_id);
        let tool_result = match (&plan.tool_call, action) {
            (Some(call), Some(action)) => {
                Some(self.executor.execute(Some(call), action, source).await)
            }
            _ => None,
        };
        debug!(
            action_id = %plan.action_id,
            recommendation = recommendation.label(),
            confidence = plan.confidence,
            "Plan applied"
        );
        ReportPlan {
            action_id: plan.action_id,
            recommendation,
            confidence: plan.confidence,
            reason: plan.reason,
            tool_result,
        }
    }
}

/// Fixed rule used without the planner: invoices and tasks become tasks,
/// dated schedule requests become placeholder tasks.
fn direct_plan(action: &Action) -> Plan {
    let reason = match action.action_type {
        ActionType::Invoice | ActionType::Task => Some("Direct rule: task created"),
        ActionType::Schedule if !action.dates.is_empty() => {
            Some("Direct rule: schedule placeholder task")
        }
        _ => None,
    };
    Plan {
        action_id: action.id.clone(),
        confidence: action.confidence,
        reason: reason.unwrap_or("No auto-action taken").to_string(),
        tool_call: reason.map(|_| ToolCall::CreateTask { priority: None }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CorruptStatePolicy;
    use crate::pipeline::dates::FixedClock;
    use crate::pipeline::types::{Priority, Recommendation};
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn pipeline(dir: &TempDir, mode: RunMode) -> Pipeline {
        let now = NaiveDate::from_ymd_opt(2025, 4, 28)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        let memory = Arc::new(MemoryStore::new(
            dir.path().join("memory.json"),
            50,
            CorruptStatePolicy::Reset,
        ));
        let tasks = Arc::new(TaskStore::new(dir.path().join("tasks.json"), Arc::clone(&memory)));
        Pipeline::new(
            Extractor::new(Arc::new(FixedClock(now))),
            Planner::default(),
            memory,
            tasks,
            mode,
        )
    }

    #[tokio::test]
    async fn invoice_creates_high_priority_task() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline(&dir, RunMode::Plan);

        let report = pipeline
            .process(&EmailInput::new("Invoice #7", "Please pay $150 by Friday."))
            .await
            .unwrap();

        assert_eq!(report.plans.len(), 1);
        let plan = &report.plans[0];
        assert_eq!(plan.recommendation, Recommendation::CreateTask);
        let task_id = plan.tool_result.as_ref().and_then(|r| r.task_id()).unwrap();

        let list = pipeline.tasks().read().await.unwrap();
        assert_eq!(list.tasks.len(), 1);
        assert_eq!(list.tasks[0].task_id, task_id);
        assert_eq!(list.tasks[0].priority, Priority::High);
        assert_eq!(list.tasks[0].source_email_id, report.email.email_id);
    }

    #[tokio::test]
    async fn every_email_is_remembered() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline(&dir, RunMode::Plan);

        let reports = pipeline
            .run_batch(&[
                EmailInput::new("Newsletter", "Nothing to do."),
                EmailInput::new("Meeting request", "Are you free 2025-05-01 at 14:00?"),
            ])
            .await
            .unwrap();

        let memory = pipeline.memory().load().await.unwrap();
        assert_eq!(memory.recent_emails.len(), 2);
        assert_eq!(memory.recent_emails[0].email_id, reports[1].email.email_id);
        assert_eq!(memory.recent_emails[0].summary, "Meeting request");
    }

    #[tokio::test]
    async fn ignored_plan_has_no_tool_result() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline(&dir, RunMode::Plan);

        let report = pipeline
            .process(&EmailInput::new("Newsletter", "Nothing to do."))
            .await
            .unwrap();
        assert_eq!(report.plans[0].recommendation, Recommendation::Ignore);
        assert!(report.plans[0].tool_result.is_none());
        assert!(pipeline.tasks().read().await.unwrap().tasks.is_empty());
    }

    #[tokio::test]
    async fn second_meeting_same_day_conflicts() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline(&dir, RunMode::Plan);

        let first = pipeline
            .process(&EmailInput::new("Sync", "Can we meet on 2025-05-01 at 10:00?"))
            .await
            .unwrap();
        assert_eq!(first.plans[0].recommendation, Recommendation::ScheduleEvent);

        let second = pipeline
            .process(&EmailInput::new("Review", "Can we meet on 2025-05-01 at 14:00?"))
            .await
            .unwrap();
        assert_eq!(second.plans[0].recommendation, Recommendation::ComposeReply);
        assert_eq!(second.plans[0].confidence, 0.6);
    }

    #[tokio::test]
    async fn direct_mode_uses_fixed_rule() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline(&dir, RunMode::Direct);

        let reports = pipeline
            .run_batch(&[
                EmailInput::new("Deck", "Kindly send the deck."),
                EmailInput::new("Sync", "Let's meet tomorrow."),
                EmailInput::new("Sync", "Let's meet soon."),
                EmailInput::new("Hello", "Just saying hi."),
            ])
            .await
            .unwrap();

        let recommendations: Vec<Recommendation> =
            reports.iter().map(|r| r.plans[0].recommendation).collect();
        assert_eq!(
            recommendations,
            vec![
                Recommendation::CreateTask,
                Recommendation::CreateTask,
                Recommendation::Ignore,
                Recommendation::Ignore,
            ]
        );
        let list = pipeline.tasks().read().await.unwrap();
        assert_eq!(list.tasks.len(), 2);
        assert_eq!(list.tasks[1].due.as_deref(), Some("2025-04-29"));
        assert_eq!(list.tasks[1].tags, vec!["schedule"]);
    }

    #[tokio::test]
    async fn corrupt_task_list_fails_planning() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline(&dir, RunMode::Plan);
        std::fs::write(dir.path().join("tasks.json"), "{bad").unwrap();

        let err = pipeline
            .process(&EmailInput::new("Sync", "Can we meet on 2025-05-01 at 10:00?"))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Planning(_)));
    }

    #[test]
    fn direct_plan_keeps_action_priority() {
        let action = Action {
            id: "a-1".into(),
            action_type: ActionType::Invoice,
            title: "t".into(),
            description: String::new(),
            dates: vec![],
            contacts: vec![],
            priority: Some(Priority::High),
            confidence: 0.9,
        };
        let plan = direct_plan(&action);
        assert_eq!(plan.tool_call, Some(ToolCall::CreateTask { priority: None }));
        assert_eq!(plan.confidence, 0.9);
    }
}
