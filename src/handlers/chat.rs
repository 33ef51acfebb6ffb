use axum::{
    extract::{State, rejection::JsonRejection},
    response::Json,
};
use std::sync::Arc;
use tracing::{debug, info};

use crate::core::chat::{ChatRequest, ChatResponse, PlainTextRenderer};
use crate::errors::{AppError, AppResult};
use crate::state::AppState;

/// POST /api/chat - one structured chat turn.
///
/// A body that is not JSON, or whose `message` is missing or blank, is
/// rejected with 400 before any upstream call.
pub async fn chat_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> AppResult<Json<ChatResponse>> {
    let Json(request) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let response = state.chat.chat(request).await?;

    info!(
        cards = response.reply.cards.len(),
        follow_ups = response.follow_up.len(),
        "Chat turn completed"
    );
    debug!(
        reply = %PlainTextRenderer.render_reply(&response.reply.summary, &response.reply.cards),
        "Rendered reply"
    );

    Ok(Json(response))
}
