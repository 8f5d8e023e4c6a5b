//! Middleware
//!
//! Tower middleware for request processing.

pub mod auth;
pub mod cors;
pub mod metrics;

pub use auth::{auth_middleware, bearer_token, AuthUser};
pub use cors::create_cors_layer;
pub use metrics::track_http_metrics;
