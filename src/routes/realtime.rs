//! Realtime session route configuration
//!
//! The browser-side bridge fetches its short-lived credential here before
//! negotiating WebRTC directly with the provider.

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::handlers::session::{create_default_session, create_session};
use crate::state::AppState;
use std::sync::Arc;

/// Create the realtime session router
///
/// # Endpoints
///
/// - `GET /session` - session in the configured default language
/// - `GET /session/{lang}` - session for `ko`, `en`, `ja` or `zh`
///
/// Both return the provider's session object, including
/// `client_secret.value`, unchanged.
pub fn create_realtime_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/session", get(create_default_session))
        .route("/session/{lang}", get(create_session))
        .layer(TraceLayer::new_for_http())
}
