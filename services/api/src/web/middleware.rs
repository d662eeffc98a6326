//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::web::state::{AppState, CurrentSession};

/// Middleware that validates the bearer token and resolves the session it
/// belongs to.
///
/// If valid, inserts a `CurrentSession` into the request extensions for
/// handlers to use. If invalid or missing, returns 401 Unauthorized.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    // 1. Extract the Authorization header
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    // 2. Parse the bearer token
    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(StatusCode::UNAUTHORIZED)?
        .trim()
        .to_string();

    // 3. Resolve the token to the email it authenticates
    let email = state
        .auth
        .validate_token(&token)
        .ok_or(StatusCode::UNAUTHORIZED)?;

    // 4. Insert the session identity into the request extensions
    req.extensions_mut().insert(CurrentSession {
        email,
        token,
    });

    // 5. Continue to the handler
    Ok(next.run(req).await)
}
