use jobgate::catalog::{JobCatalog, JobCatalogEntry};
use jobgate::executor::{execute_plan, ExecutorError, JobRun, JobsBackend};
use jobgate::plan::{extract_plan, ExtractionPolicy};
use serde_json::{Map, Value};
use std::cell::Cell;
use std::rc::Rc;

struct RecordingJobs {
    calls: Rc<Cell<usize>>,
    last_job_id: Cell<Option<u64>>,
    fail: bool,
}

impl RecordingJobs {
    fn new() -> Self {
        Self {
            calls: Rc::new(Cell::new(0)),
            last_job_id: Cell::new(None),
            fail: false,
        }
    }

    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }
}

impl JobsBackend for RecordingJobs {
    fn run_now(
        &self,
        job_id: u64,
        _parameters: &Map<String, Value>,
    ) -> Result<JobRun, ExecutorError> {
        self.calls.set(self.calls.get() + 1);
        self.last_job_id.set(Some(job_id));
        if self.fail {
            return Err(ExecutorError::Request {
                job_id,
                reason: "gateway timeout".to_string(),
            });
        }
        Ok(JobRun { run_id: 9_001 })
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

fn plan_for(raw: &str) -> jobgate::plan::ActionPlan {
    extract_plan(raw, ExtractionPolicy::Strict).expect("plan")
}

#[test]
fn execution_resolves_the_job_id_and_reports_the_run() {
    let plan = plan_for(
        r#"{"action":"run_databricks_job","arguments":{"job_name":"daily_sales_etl","parameters":{}}}"#,
    );
    let backend = RecordingJobs::new();

    let confirmation = execute_plan(&plan, &catalog(), &backend).expect("run");
    assert!(confirmation.contains("daily_sales_etl"));
    assert!(confirmation.contains("9001"));
    assert_eq!(backend.calls.get(), 1);
    assert_eq!(backend.last_job_id.get(), Some(123_456_789_012_345));
}

#[test]
fn unknown_actions_never_reach_the_backend() {
    let plan = plan_for(
        r#"{"action":"delete_workspace","arguments":{"job_name":"daily_sales_etl","parameters":{}}}"#,
    );
    let backend = RecordingJobs::new();

    let err = execute_plan(&plan, &catalog(), &backend).expect_err("unknown action");
    assert!(matches!(err, ExecutorError::UnknownAction(action) if action == "delete_workspace"));
    assert_eq!(backend.calls.get(), 0);
}

#[test]
fn unknown_jobs_never_reach_the_backend() {
    let plan = plan_for(
        r#"{"action":"run_databricks_job","arguments":{"job_name":"not_registered","parameters":{}}}"#,
    );
    let backend = RecordingJobs::new();

    let err = execute_plan(&plan, &catalog(), &backend).expect_err("unknown job");
    assert!(err.to_string().contains("unknown job `not_registered`"));
    assert_eq!(backend.calls.get(), 0);
}

#[test]
fn backend_failures_propagate_with_the_job_id() {
    let plan = plan_for(
        r#"{"action":"run_databricks_job","arguments":{"job_name":"daily_sales_etl","parameters":{}}}"#,
    );
    let backend = RecordingJobs::failing();

    let err = execute_plan(&plan, &catalog(), &backend).expect_err("failure");
    assert!(err.to_string().contains("123456789012345"));
    assert!(err.to_string().contains("gateway timeout"));
    assert_eq!(backend.calls.get(), 1);
}
