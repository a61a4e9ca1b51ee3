use crate::agent::{system_prompt, AgentError, ChatBackend, ChatMessage, CompletionRequest};
use crate::catalog::JobCatalog;
use crate::config::Settings;
use crate::executor::{execute_plan, JobsBackend};
use crate::plan::{dry_run_summary, extract_plan, ActionPlan, ExtractionPolicy};
use crate::shared::append_session_log;
use std::path::PathBuf;

pub const CANCEL_NOTICE: &str = "Action canceled. No job was started.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Idle,
    Pending,
}

/// Per-conversation state: the ordered transcript and at most one plan
/// awaiting a decision. Each front-end session owns a private value;
/// nothing here is shared or global.
#[derive(Debug, Clone, Default)]
pub struct Session {
    messages: Vec<ChatMessage>,
    pending_plan: Option<ActionPlan>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn pending_plan(&self) -> Option<&ActionPlan> {
        self.pending_plan.as_ref()
    }

    pub fn pending_summary(&self) -> Option<String> {
        self.pending_plan.as_ref().map(dry_run_summary)
    }

    pub fn state(&self) -> GateState {
        if self.pending_plan.is_some() {
            GateState::Pending
        } else {
            GateState::Idle
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The reply carried no plan; it is plain conversation.
    Reply { text: String },
    /// A plan was extracted and is now pending; the summary was appended
    /// to the transcript as the dry-run preview.
    PlanProposed { summary: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApproveOutcome {
    Executed { confirmation: String },
    Failed { error: String },
    NothingPending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CancelOutcome {
    Canceled { notice: String },
    NothingPending,
}

/// The three input events a front-end may deliver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateEvent {
    Submit(String),
    Approve,
    Cancel,
}

/// One transcript line ready for rendering by a front-end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedLine {
    pub speaker: &'static str,
    pub text: String,
}

fn assistant_line(text: String) -> RenderedLine {
    RenderedLine {
        speaker: "assistant",
        text,
    }
}

fn system_line(text: String) -> RenderedLine {
    RenderedLine {
        speaker: "system",
        text,
    }
}

/// The approval state machine separating proposal from execution. The
/// executor is only ever reached through `approve`, and a pending plan
/// is consumed by the first decision, successful or not.
pub struct ChatGate<C: ChatBackend, J: JobsBackend> {
    catalog: JobCatalog,
    chat: C,
    jobs: J,
    system_prompt: String,
    temperature: f64,
    max_output_tokens: u32,
    extraction_policy: ExtractionPolicy,
    log_root: Option<PathBuf>,
}

impl<C: ChatBackend, J: JobsBackend> ChatGate<C, J> {
    pub fn new(catalog: JobCatalog, chat: C, jobs: J, settings: &Settings) -> Self {
        let system_prompt = system_prompt(&catalog);
        Self {
            catalog,
            chat,
            jobs,
            system_prompt,
            temperature: settings.temperature,
            max_output_tokens: settings.max_output_tokens,
            extraction_policy: settings.extraction_policy,
            log_root: None,
        }
    }

    pub fn with_session_log(mut self, state_root: PathBuf) -> Self {
        self.log_root = Some(state_root);
        self
    }

    pub fn catalog(&self) -> &JobCatalog {
        &self.catalog
    }

    fn log(&self, line: &str) {
        if let Some(root) = &self.log_root {
            append_session_log(root, line);
        }
    }

    /// Sends one user turn through the translator and extractor. On a
    /// translation failure the turn aborts and the session is untouched;
    /// the user message is only committed once the call has returned.
    pub fn submit(&self, session: &mut Session, text: &str) -> Result<TurnOutcome, AgentError> {
        let mut messages = session.messages.clone();
        messages.push(ChatMessage::user(text));
        let request = CompletionRequest {
            system_prompt: self.system_prompt.clone(),
            messages,
            temperature: self.temperature,
            max_output_tokens: self.max_output_tokens,
        };
        let raw = match self.chat.complete(&request) {
            Ok(raw) => raw,
            Err(err) => {
                self.log(&format!("translation failed: {err}"));
                return Err(err);
            }
        };

        session.messages.push(ChatMessage::user(text));
        match extract_plan(&raw, self.extraction_policy) {
            Some(plan) => {
                let summary = dry_run_summary(&plan);
                self.log(&format!(
                    "plan proposed job_name=`{}`",
                    plan.arguments.job_name
                ));
                // A new valid plan replaces any lingering pending plan.
                session.pending_plan = Some(plan);
                session.messages.push(ChatMessage::assistant(&summary));
                Ok(TurnOutcome::PlanProposed { summary })
            }
            None => {
                session.messages.push(ChatMessage::assistant(&raw));
                Ok(TurnOutcome::Reply { text: raw })
            }
        }
    }

    /// Consumes the pending plan and executes it exactly once. The gate
    /// returns to idle whatever the outcome; a failed plan is not
    /// retried, resubmission is a new proposal.
    pub fn approve(&self, session: &mut Session) -> ApproveOutcome {
        let Some(plan) = session.pending_plan.take() else {
            return ApproveOutcome::NothingPending;
        };
        match execute_plan(&plan, &self.catalog, &self.jobs) {
            Ok(result) => {
                let confirmation = format!("Execution confirmed\n\n{result}");
                session.messages.push(ChatMessage::assistant(&confirmation));
                self.log(&format!(
                    "plan approved job_name=`{}`",
                    plan.arguments.job_name
                ));
                ApproveOutcome::Executed { confirmation }
            }
            Err(err) => {
                let error = err.to_string();
                session
                    .messages
                    .push(ChatMessage::assistant(format!("Job execution failed: {error}")));
                self.log(&format!(
                    "plan execution failed job_name=`{}`: {error}",
                    plan.arguments.job_name
                ));
                ApproveOutcome::Failed { error }
            }
        }
    }

    /// Discards the pending plan without any backend call.
    pub fn cancel(&self, session: &mut Session) -> CancelOutcome {
        let Some(plan) = session.pending_plan.take() else {
            return CancelOutcome::NothingPending;
        };
        session.messages.push(ChatMessage::assistant(CANCEL_NOTICE));
        self.log(&format!(
            "plan canceled job_name=`{}`",
            plan.arguments.job_name
        ));
        CancelOutcome::Canceled {
            notice: CANCEL_NOTICE.to_string(),
        }
    }

    /// Front-end convenience: routes one event and renders the outcome.
    pub fn dispatch(&self, session: &mut Session, event: GateEvent) -> Vec<RenderedLine> {
        match event {
            GateEvent::Submit(text) => match self.submit(session, &text) {
                Ok(TurnOutcome::Reply { text }) => vec![assistant_line(text)],
                Ok(TurnOutcome::PlanProposed { summary }) => vec![assistant_line(summary)],
                Err(err) => vec![system_line(format!("chat request failed: {err}"))],
            },
            GateEvent::Approve => match self.approve(session) {
                ApproveOutcome::Executed { confirmation } => vec![assistant_line(confirmation)],
                ApproveOutcome::Failed { error } => {
                    vec![system_line(format!("execution failed: {error}"))]
                }
                ApproveOutcome::NothingPending => {
                    vec![system_line("no plan is awaiting approval".to_string())]
                }
            },
            GateEvent::Cancel => match self.cancel(session) {
                CancelOutcome::Canceled { notice } => vec![assistant_line(notice)],
                CancelOutcome::NothingPending => {
                    vec![system_line("no plan is awaiting approval".to_string())]
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::JobCatalogEntry;
    use crate::executor::{ExecutorError, JobRun};
    use serde_json::{Map, Value};
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;

    const PLAN_JSON: &str = r#"{"action":"run_databricks_job","arguments":{"job_name":"daily_sales_etl","parameters":{}}}"#;

    struct ScriptedChat {
        replies: RefCell<VecDeque<String>>,
    }

    impl ScriptedChat {
        fn new(replies: &[&str]) -> Self {
            Self {
                replies: RefCell::new(replies.iter().map(|r| r.to_string()).collect()),
            }
        }
    }

    impl ChatBackend for ScriptedChat {
        fn complete(&self, _request: &CompletionRequest) -> Result<String, AgentError> {
            self.replies
                .borrow_mut()
                .pop_front()
                .ok_or_else(|| AgentError::EmptyCompletion {
                    endpoint: "scripted".to_string(),
                })
        }
    }

    struct CountingJobs {
        calls: Cell<usize>,
    }

    impl CountingJobs {
        fn new() -> Self {
            Self { calls: Cell::new(0) }
        }
    }

    impl JobsBackend for CountingJobs {
        fn run_now(
            &self,
            _job_id: u64,
            _parameters: &Map<String, Value>,
        ) -> Result<JobRun, ExecutorError> {
            self.calls.set(self.calls.get() + 1);
            Ok(JobRun { run_id: 987 })
        }
    }

    fn settings() -> Settings {
        Settings {
            workspace_host: "https://example.cloud.databricks.com".to_string(),
            token_env: "DATABRICKS_TOKEN".to_string(),
            serving_endpoint: "databricks-claude-sonnet-4".to_string(),
            temperature: 0.1,
            max_output_tokens: 500,
            extraction_policy: ExtractionPolicy::Lenient,
            jobs: Vec::new(),
        }
    }

    fn catalog() -> JobCatalog {
        JobCatalog::new(vec![JobCatalogEntry {
            label: "daily sales etl".to_string(),
            job_name: "daily_sales_etl".to_string(),
            job_id: 123_456_789_012_345,
        }])
        .expect("catalog")
    }

    #[test]
    fn dispatch_renders_proposal_and_decision_lines() {
        let gate = ChatGate::new(
            catalog(),
            ScriptedChat::new(&[PLAN_JSON]),
            CountingJobs::new(),
            &settings(),
        );
        let mut session = Session::new();

        let lines = gate.dispatch(&mut session, GateEvent::Submit("run the etl".to_string()));
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].speaker, "assistant");
        assert!(lines[0].text.contains("Dry-run plan"));
        assert_eq!(session.state(), GateState::Pending);

        let lines = gate.dispatch(&mut session, GateEvent::Approve);
        assert!(lines[0].text.contains("Run ID: `987`"));
        assert_eq!(session.state(), GateState::Idle);

        let lines = gate.dispatch(&mut session, GateEvent::Cancel);
        assert_eq!(lines[0].speaker, "system");
        assert!(lines[0].text.contains("no plan is awaiting approval"));
    }

    #[test]
    fn pending_summary_mirrors_the_dry_run_preview() {
        let gate = ChatGate::new(
            catalog(),
            ScriptedChat::new(&[PLAN_JSON]),
            CountingJobs::new(),
            &settings(),
        );
        let mut session = Session::new();
        assert_eq!(session.pending_summary(), None);

        gate.submit(&mut session, "run the etl").expect("turn");
        let summary = session.pending_summary().expect("summary");
        assert!(summary.contains("daily_sales_etl"));
    }
}
