//! HTTP boundary errors.
//!
//! `AppError` maps subsystem failures to a status code and a JSON body of the
//! form `{"error": "<code>", "message": "<text>"}`.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};

use crate::core::chat::ChatError;

/// JSON error response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Machine-readable error code
    pub error: String,
    /// Human-readable message, localized where the request language is known
    pub message: String,
}

/// Errors returned by HTTP handlers.
#[derive(Debug, Error)]
pub enum AppError {
    /// 400 - the request is malformed or incomplete
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// 500 - a required server-side setting such as an API key is missing
    #[error("Server is not configured: {0}")]
    NotConfigured(String),

    /// 502 - the upstream model provider failed
    #[error("Upstream failure: {0}")]
    Upstream(String),

    /// 500 - anything else
    #[error("Internal error: {0}")]
    Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotConfigured(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            AppError::BadRequest(_) => "bad_request",
            AppError::NotConfigured(_) => "not_configured",
            AppError::Upstream(_) => "upstream_error",
            AppError::Internal(_) => "internal_error",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();
        let message = match self {
            AppError::BadRequest(msg)
            | AppError::NotConfigured(msg)
            | AppError::Upstream(msg)
            | AppError::Internal(msg) => msg,
        };

        let body = ErrorBody {
            error: code.to_string(),
            message,
        };
        (status, Json(body)).into_response()
    }
}

impl From<ChatError> for AppError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::EmptyMessage => AppError::BadRequest(err.to_string()),
            ChatError::MissingCredential => {
                error!("Chat requested but OPENAI_API_KEY is not configured");
                AppError::NotConfigured(err.to_string())
            }
            ChatError::Upstream { language, source } => {
                warn!(error = %source, "Chat turn failed upstream");
                AppError::Upstream(language.connection_error().to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::language::Language;
    use crate::core::llm::LlmError;

    #[test]
    fn test_chat_error_mapping() {
        let err: AppError = ChatError::EmptyMessage.into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err: AppError = ChatError::MissingCredential.into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let err: AppError = ChatError::Upstream {
            language: Language::En,
            source: LlmError::NetworkError("down".to_string()),
        }
        .into();
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
        match err {
            AppError::Upstream(message) => {
                assert_eq!(message, Language::En.connection_error())
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_into_response_body() {
        let response = AppError::BadRequest("nope".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: ErrorBody = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.error, "bad_request");
        assert_eq!(body.message, "nope");
    }
}
