//! Route Configuration
//!
//! Configures all HTTP routes for the API.

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    response::IntoResponse,
    routing::{get, patch, post},
    Router,
};
use tower_http::{services::ServeDir, trace::TraceLayer};

use super::handlers::{health, message, room};
use crate::infrastructure::metrics;
use crate::presentation::middleware::{auth_middleware, create_cors_layer, track_http_metrics};
use crate::presentation::websocket::signaling_handler;
use crate::startup::AppState;

/// Create the main API router
pub fn create_router(state: AppState) -> Router {
    let settings = state.settings.clone();

    Router::new()
        .nest("/api/v1", api_routes(state.clone()))
        // Call signaling; authenticates during the upgrade
        .route("/signaling/{call_id}", get(signaling_handler))
        // Health check endpoints
        .route("/health", get(health::health_check))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        // Prometheus metrics endpoint
        .route("/metrics", get(metrics_handler))
        .route_layer(middleware::from_fn(track_http_metrics))
        // Stored avatars and attachments
        .nest_service(
            &settings.uploads.public_prefix,
            ServeDir::new(&settings.uploads.directory),
        )
        .layer(DefaultBodyLimit::max(settings.uploads.max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(create_cors_layer(&settings.cors))
        .with_state(state)
}

/// Prometheus metrics endpoint handler
async fn metrics_handler() -> impl IntoResponse {
    let metrics = metrics::gather_metrics();
    (
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        metrics,
    )
}

/// API v1 routes
fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .merge(public_routes())
        .merge(protected_routes(state))
}

/// Read-only routes open to anonymous callers
fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/rooms", get(room::list_rooms))
        .route("/rooms/{room_id}/messages", get(message::list_messages))
        .route("/messages/{message_id}/reads", get(message::read_receipts))
}

/// Routes that act on behalf of the caller (require authentication)
fn protected_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Rooms
        .route("/rooms/group", post(room::create_group))
        .route("/rooms/private", post(room::get_or_create_private))
        .route(
            "/rooms/{room_id}",
            patch(room::update_group).delete(room::delete_group),
        )
        .route("/rooms/{room_id}/members", get(room::get_members))
        .route("/rooms/{room_id}/invite", post(room::invite_members))
        .route("/rooms/{room_id}/invite-link", get(room::invite_link))
        .route("/rooms/{room_id}/join", post(room::join_public))
        // Messages
        .route("/rooms/{room_id}/messages", post(message::send_message))
        .route("/rooms/{room_id}/messages/upload", post(message::upload_message))
        .route(
            "/messages/{message_id}",
            patch(message::edit_message).delete(message::delete_message),
        )
        .route(
            "/messages/{message_id}/reactions",
            post(message::add_reaction).delete(message::remove_reaction),
        )
        .route("/messages/{message_id}/read", post(message::mark_read))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}
