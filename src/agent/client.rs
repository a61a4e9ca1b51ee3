use super::{AgentError, ChatMessage};
use crate::config::Settings;
use serde::Deserialize;
use serde_json::json;

/// Blocking seam in front of the remote chat completion call. One
/// request per user turn; transient failures are surfaced, not retried.
pub trait ChatBackend {
    fn complete(&self, request: &CompletionRequest) -> Result<String, AgentError>;
}

#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system_prompt: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f64,
    pub max_output_tokens: u32,
}

/// Chat client for a Databricks model serving endpoint.
#[derive(Debug, Clone)]
pub struct ServingEndpointClient {
    api_base: String,
    endpoint: String,
    token: String,
}

#[derive(Debug, Clone, Deserialize)]
struct CompletionEnvelope {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Clone, Deserialize)]
struct CompletionChoice {
    message: CompletionReply,
}

#[derive(Debug, Clone, Deserialize)]
struct CompletionReply {
    #[serde(default)]
    content: String,
}

impl ServingEndpointClient {
    pub fn from_settings(settings: &Settings) -> Result<Self, AgentError> {
        let token = std::env::var(&settings.token_env)
            .map_err(|_| AgentError::MissingToken(settings.token_env.clone()))?;
        Ok(Self {
            api_base: settings.workspace_host.trim_end_matches('/').to_string(),
            endpoint: settings.serving_endpoint.clone(),
            token,
        })
    }

    fn invocation_url(&self) -> String {
        format!(
            "{}/serving-endpoints/{}/invocations",
            self.api_base, self.endpoint
        )
    }
}

impl ChatBackend for ServingEndpointClient {
    fn complete(&self, request: &CompletionRequest) -> Result<String, AgentError> {
        let mut wire_messages = vec![ChatMessage::system(request.system_prompt.clone())];
        wire_messages.extend(request.messages.iter().cloned());
        let body = json!({
            "messages": wire_messages,
            "temperature": request.temperature,
            "max_tokens": request.max_output_tokens,
        });

        let response = ureq::post(&self.invocation_url())
            .set("Authorization", &format!("Bearer {}", self.token))
            .send_json(body)
            .map_err(|e| AgentError::Request {
                endpoint: self.endpoint.clone(),
                reason: e.to_string(),
            })?;

        let envelope: CompletionEnvelope =
            response.into_json().map_err(|e| AgentError::Decode {
                endpoint: self.endpoint.clone(),
                reason: e.to_string(),
            })?;
        let choice = envelope
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AgentError::EmptyCompletion {
                endpoint: self.endpoint.clone(),
            })?;
        Ok(choice.message.content)
    }
}
