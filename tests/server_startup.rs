//! Server Startup Tests
//!
//! Tests for state construction, facts loading and serving over a real socket.

use std::fs;
use std::time::Duration;

use axum::{body::Body, http::Request};
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::time::timeout;
use tower::util::ServiceExt;

use festival_concierge::{ServerConfig, routes, state::AppState};

/// Helper function to create a minimal test configuration
fn create_minimal_config() -> ServerConfig {
    let mut config = ServerConfig::default();
    config.host = "127.0.0.1".to_string();
    config.port = 0;
    config
}

/// The server boots without an API key and reports it in the health check
#[tokio::test]
async fn test_minimal_config_boot() {
    let app_state = AppState::new(create_minimal_config()).unwrap();
    let app = routes::create_router(app_state);

    let request = Request::builder().uri("/").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), axum::http::StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let health: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(health["ai_configured"], false);
    assert_eq!(health["version"], env!("CARGO_PKG_VERSION"));
}

/// Facts are loaded from the configured file instead of the bundled copy
#[tokio::test]
async fn test_facts_file_is_loaded() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("festival.json");
    fs::write(
        &path,
        r#"{"name": "Harbor Lights Festival", "period": "Oct 3 - Oct 5"}"#,
    )
    .unwrap();

    let mut config = create_minimal_config();
    config.festival_data_path = Some(path);
    let app_state = AppState::new(config).unwrap();
    assert_eq!(app_state.facts.summary().name, "Harbor Lights Festival");

    let app = routes::create_router(app_state);
    let request = Request::builder()
        .uri("/festival")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let facts: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(facts["period"], "Oct 3 - Oct 5");
}

/// A missing or malformed facts file fails startup
#[tokio::test]
async fn test_bad_facts_file_fails_startup() {
    let mut config = create_minimal_config();
    config.festival_data_path = Some("/nonexistent/festival.json".into());
    assert!(AppState::new(config).is_err());

    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("festival.json");
    fs::write(&path, "[1, 2, 3]").unwrap();
    let mut config = create_minimal_config();
    config.festival_data_path = Some(path);
    assert!(AppState::new(config).is_err());
}

/// Unknown routes are 404
#[tokio::test]
async fn test_unknown_route() {
    let app = routes::create_router(AppState::new(create_minimal_config()).unwrap());

    let request = Request::builder()
        .uri("/voices")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), axum::http::StatusCode::NOT_FOUND);
}

/// The router serves requests over a real TCP listener
#[tokio::test]
async fn test_serves_over_tcp() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    let app = routes::create_router(AppState::new(create_minimal_config()).unwrap());

    let server = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let response = timeout(
        Duration::from_secs(5),
        reqwest::get(format!("http://{address}/")),
    )
    .await
    .expect("server responds in time")
    .unwrap();
    assert!(response.status().is_success());

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "OK");

    server.abort();
}
