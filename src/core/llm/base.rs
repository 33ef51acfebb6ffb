//! Base trait and types for chat-completion models.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors that can occur when calling a chat model.
#[derive(Debug, Error)]
pub enum LlmError {
    /// No API key configured; no request was attempted
    #[error("Missing API key")]
    MissingApiKey,

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Network failure before a response was received
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Non-success HTTP status from the provider
    #[error("Provider error (status {status}): {message}")]
    ProviderError {
        /// HTTP status code
        status: u16,
        /// Provider error message or raw body
        message: String,
    },

    /// Response body did not have the expected shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Result type for model calls.
pub type LlmResult<T> = Result<T, LlmError>;

/// Author of one prompt message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Instructions
    System,
    /// End user
    User,
    /// Model
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// One prompt message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// One completion request.
#[derive(Debug, Clone, Default)]
pub struct CompletionRequest {
    /// Model override; the client default is used when `None`
    pub model: Option<String>,
    /// Prompt messages in order
    pub messages: Vec<ChatMessage>,
    /// Sampling temperature
    pub temperature: Option<f32>,
    /// Ask the provider to constrain output to a JSON object
    pub json_output: bool,
}

/// A chat-completion model.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Run one completion and return the raw text of the first choice.
    async fn complete(&self, request: CompletionRequest) -> LlmResult<String>;
}
