use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The single action tag the executor accepts.
pub const RUN_JOB_ACTION: &str = "run_databricks_job";

/// How the extractor recovers a plan object from raw model output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionPolicy {
    /// The entire reply, after trimming, must be the plan object.
    Strict,
    /// The first balanced top-level brace-delimited object is decoded.
    #[default]
    Lenient,
}

impl ExtractionPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Lenient => "lenient",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, String> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "lenient" => Ok(Self::Lenient),
            _ => Err("extraction policy must be one of: strict, lenient".to_string()),
        }
    }
}

impl std::fmt::Display for ExtractionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PlanArguments {
    pub job_name: String,
    #[serde(default)]
    pub parameters: Map<String, Value>,
}

/// A structured, machine-actionable description of one proposed job run.
/// Wire shape: `{"action": "...", "arguments": {"job_name": "...", "parameters": {...}}}`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ActionPlan {
    pub action: String,
    pub arguments: PlanArguments,
}

/// Recovers a plan from raw model output. Anything that does not decode
/// into the full plan shape degrades to `None`, meaning the reply is
/// plain conversation. The `action` key is the discriminator between a
/// plan and a JSON-shaped conversational answer; a candidate with a
/// missing or blank `job_name` is a parse failure, not a plan.
pub fn extract_plan(raw: &str, policy: ExtractionPolicy) -> Option<ActionPlan> {
    let candidate = match policy {
        ExtractionPolicy::Strict => {
            let trimmed = raw.trim();
            if !trimmed.starts_with('{') {
                return None;
            }
            trimmed
        }
        ExtractionPolicy::Lenient => first_json_object(raw)?,
    };
    let plan: ActionPlan = serde_json::from_str(candidate).ok()?;
    if plan.action.trim().is_empty() || plan.arguments.job_name.trim().is_empty() {
        return None;
    }
    Some(plan)
}

/// Non-executing preview of a pending plan, appended to the transcript
/// while the gate waits for a decision.
pub fn dry_run_summary(plan: &ActionPlan) -> String {
    let arguments =
        serde_json::to_string_pretty(&plan.arguments).unwrap_or_else(|_| "{}".to_string());
    format!(
        "Dry-run plan\n\naction: {}\narguments:\n{}\n\nWaiting for approval. No job has been started.",
        plan.action, arguments
    )
}

fn first_json_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (offset, ch) in raw[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&raw[start..start + offset + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}
