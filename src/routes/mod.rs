pub mod api;
pub mod realtime;

use axum::{Router, routing::get};
use std::sync::Arc;

use crate::handlers::api::health_check;
use crate::state::AppState;

/// All application routes with state applied.
///
/// Transport layers (CORS, rate limiting, security headers) are added by the
/// binary.
pub fn create_router(state: Arc<AppState>) -> Router {
    let public_routes = Router::new().route("/", get(health_check));

    public_routes
        .merge(api::create_api_router())
        .merge(realtime::create_realtime_router())
        .with_state(state)
}
