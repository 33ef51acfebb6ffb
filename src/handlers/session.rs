use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{error, warn};

use crate::core::language::Language;
use crate::core::realtime::RealtimeError;
use crate::state::AppState;

/// GET /session - realtime session in the default language.
pub async fn create_default_session(State(state): State<Arc<AppState>>) -> Response {
    let language = state.config.default_language;
    mint_session(&state, language).await
}

/// GET /session/{lang} - realtime session whose instructions speak `lang`.
///
/// Unknown language codes fall back to the default language.
pub async fn create_session(
    State(state): State<Arc<AppState>>,
    Path(lang): Path<String>,
) -> Response {
    let language = Language::parse(&lang).unwrap_or_else(|| {
        warn!(requested = %lang, "Unsupported session language, using default");
        state.config.default_language
    });
    mint_session(&state, language).await
}

async fn mint_session(state: &AppState, language: Language) -> Response {
    match state.minter.mint(state.facts.summary(), language).await {
        Ok(body) => Json(body).into_response(),
        Err(RealtimeError::ProviderError { status, body }) => {
            // Pass the provider's answer through unchanged
            let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
            let body = serde_json::from_str::<Value>(&body)
                .unwrap_or_else(|_| json!({ "error": body }));
            (status, Json(body)).into_response()
        }
        Err(e) => {
            error!(error = %e, language = %language, "Session route error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to create session" })),
            )
                .into_response()
        }
    }
}
