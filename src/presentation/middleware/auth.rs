//! Authentication Middleware
//!
//! Bearer token validation for protected routes. Tokens are issued by the
//! auth service; this layer only verifies them.

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};

use crate::domain::Identity;
use crate::shared::error::AppError;
use crate::startup::AppState;

/// Authenticated user extension
#[derive(Debug, Clone)]
pub struct AuthUser(pub Identity);

/// Bearer token from the `Authorization` header, if any.
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .typed_get::<Authorization<Bearer>>()
        .map(|auth| auth.token().trim().to_string())
        .filter(|token| !token.is_empty())
}

/// Authentication middleware that validates bearer tokens
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(request.headers())
        .ok_or_else(|| AppError::Unauthorized("Missing authorization header".into()))?;

    let identity = state.tokens.validate(&token)?;

    // The in-memory directory learns users from their tokens.
    if let Err(e) = state.users.remember(&identity).await {
        tracing::warn!(user_id = identity.user_id, error = %e, "Failed to record identity");
    }

    // Insert authenticated user into request extensions
    request.extensions_mut().insert(AuthUser(identity));

    // Continue to the next handler
    Ok(next.run(request).await)
}
