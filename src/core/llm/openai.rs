//! OpenAI chat-completions client.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::debug;

use super::base::{ChatMessage, ChatModel, CompletionRequest, LlmError, LlmResult};

/// Default OpenAI API base URL.
pub const OPENAI_API_BASE_URL: &str = "https://api.openai.com";

/// Path of the chat-completions endpoint.
const CHAT_COMPLETIONS_PATH: &str = "/v1/chat/completions";

/// Settings for `OpenAIChatModel`.
#[derive(Debug, Clone)]
pub struct OpenAIChatConfig {
    /// API key; an empty key makes every call fail with `MissingApiKey`
    pub api_key: String,
    /// API base URL
    pub base_url: String,
    /// Model used when a request does not name one
    pub default_model: String,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for OpenAIChatConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: OPENAI_API_BASE_URL.to_string(),
            default_model: "gpt-4o-mini".to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIErrorResponse {
    error: OpenAIErrorBody,
}

#[derive(Debug, Deserialize)]
struct OpenAIErrorBody {
    #[serde(default)]
    message: String,
    #[serde(rename = "type", default)]
    error_type: String,
}

/// Chat model backed by the OpenAI HTTP API.
#[derive(Debug, Clone)]
pub struct OpenAIChatModel {
    client: Client,
    config: OpenAIChatConfig,
}

impl OpenAIChatModel {
    pub fn new(config: OpenAIChatConfig) -> LlmResult<Self> {
        if config.default_model.trim().is_empty() {
            return Err(LlmError::InvalidConfiguration(
                "Default model cannot be empty".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .pool_max_idle_per_host(4)
            .build()
            .map_err(|e| LlmError::InvalidConfiguration(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    fn api_url(&self) -> String {
        format!(
            "{}{}",
            self.config.base_url.trim_end_matches('/'),
            CHAT_COMPLETIONS_PATH
        )
    }
}

#[async_trait]
impl ChatModel for OpenAIChatModel {
    async fn complete(&self, request: CompletionRequest) -> LlmResult<String> {
        if self.config.api_key.trim().is_empty() {
            return Err(LlmError::MissingApiKey);
        }

        let model = request
            .model
            .as_deref()
            .unwrap_or(self.config.default_model.as_str());
        let body = ChatCompletionBody {
            model,
            messages: &request.messages,
            temperature: request.temperature,
            response_format: request
                .json_output
                .then(|| json!({ "type": "json_object" })),
        };

        debug!(model = %model, messages = request.messages.len(), "Sending chat completion");

        let response = self
            .client
            .post(self.api_url())
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::NetworkError(format!("Request failed: {e}")))?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .map_err(|e| LlmError::NetworkError(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            let message = if let Ok(error_response) =
                serde_json::from_str::<OpenAIErrorResponse>(&response_text)
            {
                format!(
                    "OpenAI API error: {} ({})",
                    error_response.error.message, error_response.error.error_type
                )
            } else {
                format!("OpenAI API error ({}): {}", status, response_text)
            };
            return Err(LlmError::ProviderError {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ChatCompletionResponse = serde_json::from_str(&response_text)
            .map_err(|e| LlmError::InvalidResponse(format!("Malformed completion: {e}")))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| LlmError::InvalidResponse("Completion has no content".to_string()))
    }
}
