use crate::catalog::{CatalogError, JobCatalog};
use crate::config::Settings;
use crate::plan::{ActionPlan, RUN_JOB_ACTION};
use serde::Deserialize;
use serde_json::{json, Map, Value};

#[derive(Debug, thiserror::Error)]
pub enum ExecutorError {
    #[error("unknown action `{0}`")]
    UnknownAction(String),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("job run request failed for job id {job_id}: {reason}")]
    Request { job_id: u64, reason: String },
    #[error("job run response decode failed for job id {job_id}: {reason}")]
    Decode { job_id: u64, reason: String },
    #[error("environment variable `{0}` is not set; cannot authenticate job run requests")]
    MissingToken(String),
}

/// Opaque token identifying one job invocation, assigned by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobRun {
    pub run_id: u64,
}

/// Blocking seam in front of the remote job-execution backend. The call
/// is not idempotent and must never be retried here: a failure after the
/// backend accepted the run could otherwise start the job twice.
pub trait JobsBackend {
    fn run_now(&self, job_id: u64, parameters: &Map<String, Value>) -> Result<JobRun, ExecutorError>;
}

/// Validates an approved plan against the catalog and issues exactly one
/// `run now` call. The returned confirmation carries the run id.
pub fn execute_plan<B: JobsBackend>(
    plan: &ActionPlan,
    catalog: &JobCatalog,
    backend: &B,
) -> Result<String, ExecutorError> {
    if plan.action != RUN_JOB_ACTION {
        return Err(ExecutorError::UnknownAction(plan.action.clone()));
    }
    let job_id = catalog.lookup(&plan.arguments.job_name)?;
    let run = backend.run_now(job_id, &plan.arguments.parameters)?;
    Ok(format!(
        "Job `{}` started\nRun ID: `{}`",
        plan.arguments.job_name, run.run_id
    ))
}

/// Jobs API client for a Databricks workspace.
#[derive(Debug, Clone)]
pub struct DatabricksJobsClient {
    api_base: String,
    token: String,
}

#[derive(Debug, Clone, Deserialize)]
struct RunNowResponse {
    run_id: u64,
}

impl DatabricksJobsClient {
    pub fn from_settings(settings: &Settings) -> Result<Self, ExecutorError> {
        let token = std::env::var(&settings.token_env)
            .map_err(|_| ExecutorError::MissingToken(settings.token_env.clone()))?;
        Ok(Self {
            api_base: settings.workspace_host.trim_end_matches('/').to_string(),
            token,
        })
    }
}

impl JobsBackend for DatabricksJobsClient {
    fn run_now(&self, job_id: u64, parameters: &Map<String, Value>) -> Result<JobRun, ExecutorError> {
        let url = format!("{}/api/2.1/jobs/run-now", self.api_base);
        let mut body = json!({ "job_id": job_id });
        if !parameters.is_empty() {
            body["notebook_params"] = Value::Object(parameters.clone());
        }

        let response = ureq::post(&url)
            .set("Authorization", &format!("Bearer {}", self.token))
            .send_json(body)
            .map_err(|e| ExecutorError::Request {
                job_id,
                reason: e.to_string(),
            })?;

        let run: RunNowResponse = response.into_json().map_err(|e| ExecutorError::Decode {
            job_id,
            reason: e.to_string(),
        })?;
        Ok(JobRun {
            run_id: run.run_id,
        })
    }
}
