use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("unknown job `{job_name}`; it is not registered in the job catalog")]
    UnknownJob { job_name: String },
    #[error("duplicate job name `{job_name}` in job catalog")]
    DuplicateJobName { job_name: String },
    #[error("duplicate job id {job_id} in job catalog")]
    DuplicateJobId { job_id: u64 },
    #[error("job catalog validation failed: {0}")]
    Validation(String),
}

/// One pre-registered job: the human-friendly label shown to the model,
/// the canonical name the model must echo back, and the backend job id.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct JobCatalogEntry {
    pub label: String,
    pub job_name: String,
    pub job_id: u64,
}

/// Read-only mapping from canonical job names to backend job ids.
/// Built once at startup; uniqueness is enforced at construction.
#[derive(Debug, Clone)]
pub struct JobCatalog {
    entries: Vec<JobCatalogEntry>,
}

impl JobCatalog {
    pub fn new(entries: Vec<JobCatalogEntry>) -> Result<Self, CatalogError> {
        let mut names = HashSet::new();
        let mut ids = HashSet::new();
        for entry in &entries {
            if entry.label.trim().is_empty() {
                return Err(CatalogError::Validation(format!(
                    "entry for job id {} has an empty label",
                    entry.job_id
                )));
            }
            if entry.job_name.trim().is_empty() {
                return Err(CatalogError::Validation(format!(
                    "entry `{}` has an empty job_name",
                    entry.label
                )));
            }
            if !names.insert(entry.job_name.as_str()) {
                return Err(CatalogError::DuplicateJobName {
                    job_name: entry.job_name.clone(),
                });
            }
            if !ids.insert(entry.job_id) {
                return Err(CatalogError::DuplicateJobId {
                    job_id: entry.job_id,
                });
            }
        }
        Ok(Self { entries })
    }

    pub fn lookup(&self, job_name: &str) -> Result<u64, CatalogError> {
        self.entries
            .iter()
            .find(|entry| entry.job_name == job_name)
            .map(|entry| entry.job_id)
            .ok_or_else(|| CatalogError::UnknownJob {
                job_name: job_name.to_string(),
            })
    }

    pub fn entries(&self) -> &[JobCatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(label: &str, job_name: &str, job_id: u64) -> JobCatalogEntry {
        JobCatalogEntry {
            label: label.to_string(),
            job_name: job_name.to_string(),
            job_id,
        }
    }

    #[test]
    fn lookup_resolves_registered_names() {
        let catalog = JobCatalog::new(vec![
            entry("daily sales etl", "daily_sales_etl", 123_456_789_012_345),
            entry("weekly rollup", "weekly_rollup", 42),
        ])
        .expect("catalog");
        assert_eq!(
            catalog.lookup("daily_sales_etl").expect("lookup"),
            123_456_789_012_345
        );
    }

    #[test]
    fn lookup_rejects_unregistered_names() {
        let catalog = JobCatalog::new(vec![entry("daily sales etl", "daily_sales_etl", 1)])
            .expect("catalog");
        let err = catalog.lookup("unknown_job").expect_err("unknown");
        assert!(matches!(err, CatalogError::UnknownJob { job_name } if job_name == "unknown_job"));
    }

    #[test]
    fn duplicate_names_and_ids_are_rejected() {
        let err = JobCatalog::new(vec![
            entry("a", "same_name", 1),
            entry("b", "same_name", 2),
        ])
        .expect_err("duplicate name");
        assert!(matches!(err, CatalogError::DuplicateJobName { .. }));

        let err = JobCatalog::new(vec![entry("a", "one", 7), entry("b", "two", 7)])
            .expect_err("duplicate id");
        assert!(matches!(err, CatalogError::DuplicateJobId { job_id: 7 }));
    }

    #[test]
    fn blank_fields_are_rejected() {
        let err = JobCatalog::new(vec![entry("", "one", 1)]).expect_err("blank label");
        assert!(matches!(err, CatalogError::Validation(_)));

        let err = JobCatalog::new(vec![entry("a", "  ", 1)]).expect_err("blank name");
        assert!(matches!(err, CatalogError::Validation(_)));
    }
}
