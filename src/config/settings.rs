use crate::catalog::{JobCatalog, JobCatalogEntry};
use crate::config::ConfigError;
use crate::plan::ExtractionPolicy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub workspace_host: String,
    #[serde(default = "default_token_env")]
    pub token_env: String,
    pub serving_endpoint: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
    #[serde(default)]
    pub extraction_policy: ExtractionPolicy,
    #[serde(default)]
    pub jobs: Vec<JobCatalogEntry>,
}

fn default_token_env() -> String {
    "DATABRICKS_TOKEN".to_string()
}

fn default_temperature() -> f64 {
    0.1
}

fn default_max_output_tokens() -> u32 {
    500
}

impl Settings {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let host = self.workspace_host.trim();
        if host.is_empty() {
            return Err(ConfigError::Settings(
                "workspace_host must not be empty".to_string(),
            ));
        }
        if !host.starts_with("http://") && !host.starts_with("https://") {
            return Err(ConfigError::Settings(
                "workspace_host must be an http(s) URL".to_string(),
            ));
        }
        if self.token_env.trim().is_empty() {
            return Err(ConfigError::Settings(
                "token_env must not be empty".to_string(),
            ));
        }
        if self.serving_endpoint.trim().is_empty() {
            return Err(ConfigError::Settings(
                "serving_endpoint must not be empty".to_string(),
            ));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::Settings(
                "temperature must be between 0.0 and 2.0".to_string(),
            ));
        }
        if self.max_output_tokens == 0 {
            return Err(ConfigError::Settings(
                "max_output_tokens must be greater than zero".to_string(),
            ));
        }
        if self.jobs.is_empty() {
            return Err(ConfigError::Settings(
                "at least one job catalog entry is required".to_string(),
            ));
        }
        self.job_catalog()?;
        Ok(())
    }

    pub fn job_catalog(&self) -> Result<JobCatalog, ConfigError> {
        Ok(JobCatalog::new(self.jobs.clone())?)
    }
}
