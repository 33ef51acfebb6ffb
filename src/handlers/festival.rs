use axum::{extract::State, response::Json};
use serde_json::Value;
use std::sync::Arc;

use crate::state::AppState;

/// GET /festival - the festival facts used for grounding.
pub async fn get_festival(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(state.facts.raw().clone())
}
