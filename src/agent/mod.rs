use serde::{Deserialize, Serialize};

pub mod client;
pub mod prompt;

pub use client::{ChatBackend, CompletionRequest, ServingEndpointClient};
pub use prompt::system_prompt;

#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("chat completion request failed for endpoint `{endpoint}`: {reason}")]
    Request { endpoint: String, reason: String },
    #[error("chat completion response decode failed for endpoint `{endpoint}`: {reason}")]
    Decode { endpoint: String, reason: String },
    #[error("chat completion response contained no choices for endpoint `{endpoint}`")]
    EmptyCompletion { endpoint: String },
    #[error("environment variable `{0}` is not set; cannot authenticate chat requests")]
    MissingToken(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for ChatRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One transcript entry. The session owns an append-only ordered
/// sequence of these; the system instruction is never stored here, it is
/// prepended by the client on each request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}
