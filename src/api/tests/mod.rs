use super::*;
use crate::error::{ApiError, ExportError};
use crate::export::test_helpers::{
    Gate, RecordingSink, ScriptedFetcher, ScriptedResolver, create_test_orchestrator,
    wait_until_idle,
};
use crate::export::{DownloadSink, InfoResolver, PartFetcher};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use std::time::Duration;
use tower::ServiceExt;

mod exports;

/// Orchestrator wrapped in Arc plus a router over it
fn create_test_app(
    resolver: Arc<dyn InfoResolver>,
    fetcher: Arc<dyn PartFetcher>,
    sink: Arc<dyn DownloadSink>,
) -> (Arc<ExportOrchestrator>, Router, tempfile::TempDir) {
    let (orchestrator, temp_dir) = create_test_orchestrator(resolver, fetcher, sink);
    let orchestrator = Arc::new(orchestrator);
    let app = create_router(orchestrator.clone(), orchestrator.get_config());
    (orchestrator, app, temp_dir)
}

fn default_test_app() -> (Arc<ExportOrchestrator>, Router, tempfile::TempDir) {
    create_test_app(
        ScriptedResolver::parts(2),
        Arc::new(ScriptedFetcher::new()),
        Arc::new(RecordingSink::new()),
    )
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_api_server_spawns() {
    let (orchestrator, _app, _temp_dir) = default_test_app();

    let mut config = (*orchestrator.get_config()).clone();
    config.server.api.bind_address = "127.0.0.1:0".parse().unwrap();
    let config = Arc::new(config);

    let api_handle = tokio::spawn({
        let orchestrator = orchestrator.clone();
        let config = config.clone();
        async move { start_api_server(orchestrator, config).await }
    });

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!api_handle.is_finished(), "server exited early");
    api_handle.abort();
}

#[tokio::test]
async fn test_cors_enabled() {
    let (_orchestrator, app, _temp_dir) = default_test_app();

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response
            .headers()
            .contains_key("access-control-allow-origin")
    );
}

#[tokio::test]
async fn test_cors_disabled() {
    let (orchestrator, _app, _temp_dir) = default_test_app();

    let mut config = (*orchestrator.get_config()).clone();
    config.server.api.cors_enabled = false;
    let app = create_router(orchestrator, Arc::new(config));

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert!(
        !response
            .headers()
            .contains_key("access-control-allow-origin")
    );
}

#[tokio::test]
async fn test_cors_specific_origins() {
    let (orchestrator, _app, _temp_dir) = default_test_app();

    let mut config = (*orchestrator.get_config()).clone();
    config.server.api.cors_origins = vec!["http://dashboard.local".to_string()];
    let app = create_router(orchestrator, Arc::new(config));

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://dashboard.local")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(
        response.headers()["access-control-allow-origin"],
        "http://dashboard.local"
    );
}

#[tokio::test]
async fn test_swagger_ui_toggle() {
    let (orchestrator, app, _temp_dir) = default_test_app();

    let response = app.oneshot(get_request("/swagger-ui")).await.unwrap();
    assert_ne!(response.status(), StatusCode::NOT_FOUND);

    let mut config = (*orchestrator.get_config()).clone();
    config.server.api.swagger_ui = false;
    let app = create_router(orchestrator, Arc::new(config));

    let response = app.oneshot(get_request("/swagger-ui")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
