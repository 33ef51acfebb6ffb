use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::handlers::{chat, festival};
use crate::state::AppState;
use std::sync::Arc;

/// Create the API router
///
/// - `GET /festival` - festival facts
/// - `POST /api/chat` - structured chat turn
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/festival", get(festival::get_festival))
        .route("/api/chat", post(chat::chat_handler))
        .layer(TraceLayer::new_for_http())
}
