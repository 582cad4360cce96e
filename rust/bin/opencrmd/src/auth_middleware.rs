//! Session token middleware.
//!
//! Reads the token from `x-auth-token` (or `Authorization: Bearer <token>`),
//! verifies it, and stores the [`auth::Claims`] in request extensions for
//! downstream handlers. Requests that fail here never reach a handler.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;

use auth::service::AuthService;
use opencrm_core::ServiceError;

pub const TOKEN_HEADER: &str = "x-auth-token";

pub async fn auth_middleware(
    State(auth): State<Arc<AuthService>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ServiceError> {
    if is_public_path(request.uri().path()) {
        return Ok(next.run(request).await);
    }

    let token = extract_token(request.headers())
        .ok_or_else(|| ServiceError::Unauthorized("no session token".into()))?;

    let claims = auth.verify_token(token).map_err(|e| {
        tracing::warn!(path = %request.uri().path(), error = %e, "rejected session token");
        e
    })?;

    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

fn extract_token(headers: &HeaderMap) -> Option<&str> {
    if let Some(token) = headers.get(TOKEN_HEADER).and_then(|v| v.to_str().ok()) {
        return Some(token.trim()).filter(|t| !t.is_empty());
    }
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Check if a request path is public (no session required).
fn is_public_path(path: &str) -> bool {
    matches!(path, "/health" | "/version" | "/api/auth/login") || path.starts_with("/api/holidays/")
}
