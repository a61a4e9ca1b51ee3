use crate::catalog::JobCatalog;
use crate::plan::RUN_JOB_ACTION;

/// Builds the fixed system instruction: the known jobs, the required
/// plan JSON shape, and the behavioral rules.
pub fn system_prompt(catalog: &JobCatalog) -> String {
    let known_jobs = catalog
        .entries()
        .iter()
        .map(|entry| format!("- {} -> job_name: {}", entry.label, entry.job_name))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "You are an assistant that helps operators launch pre-registered Databricks jobs.\n\
         \n\
         Known jobs:\n\
         {known_jobs}\n\
         \n\
         When the user asks to run a job, reply with a single JSON object of exactly this shape:\n\
         {{\n\
         \x20 \"action\": \"{RUN_JOB_ACTION}\",\n\
         \x20 \"arguments\": {{\n\
         \x20   \"job_name\": \"<job_name>\",\n\
         \x20   \"parameters\": {{}}\n\
         \x20 }}\n\
         }}\n\
         \n\
         Rules:\n\
         - Never invent job names; only use the job_name values listed above.\n\
         - Ask a clarifying question when required information is missing.\n\
         - Never execute anything and never claim a job was started; execution happens elsewhere after human approval."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{JobCatalog, JobCatalogEntry};

    #[test]
    fn prompt_lists_catalog_and_plan_shape() {
        let catalog = JobCatalog::new(vec![JobCatalogEntry {
            label: "daily sales etl".to_string(),
            job_name: "daily_sales_etl".to_string(),
            job_id: 123_456_789_012_345,
        }])
        .expect("catalog");

        let prompt = system_prompt(&catalog);
        assert!(prompt.contains("- daily sales etl -> job_name: daily_sales_etl"));
        assert!(prompt.contains("\"action\": \"run_databricks_job\""));
        assert!(prompt.contains("Never invent job names"));
        assert!(prompt.contains("Ask a clarifying question"));
    }
}
