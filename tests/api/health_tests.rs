//! Health Check and Metrics API Tests

use axum::http::StatusCode;
use pretty_assertions::assert_eq;

use crate::common::TestApp;

#[tokio::test]
async fn test_health_check_reports_storage() {
    let app = TestApp::new().await;

    let (status, body) = app.get("/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["storage"], "memory");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_liveness_probe() {
    let app = TestApp::new().await;

    let (status, body) = app.get("/health/live", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "alive");
}

#[tokio::test]
async fn test_readiness_probe_on_memory_store() {
    let app = TestApp::new().await;

    let (status, body) = app.get("/health/ready", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["storage"]["kind"], "memory");
    assert_eq!(body["signaling"]["active_calls"], 0);
}

#[tokio::test]
async fn test_metrics_expose_chat_counters() {
    let app = TestApp::new().await;
    let alice = app.login(1, "alice").await;
    let room_id = app.create_group(&alice, "metrics-room", &[]).await;
    app.send_text(&alice, &room_id, "hello").await;

    let (status, body) = app.get("/metrics", None).await;

    assert_eq!(status, StatusCode::OK);
    let text = body.as_str().expect("metrics are plain text");
    assert!(text.contains("chat_backend_messages_sent_total"));
    assert!(text.contains("chat_backend_rooms_created_total"));
    assert!(text.contains("chat_backend_http_requests_total"));
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let app = TestApp::new().await;

    let (status, _) = app.get("/api/v1/nope", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}
