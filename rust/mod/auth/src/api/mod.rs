mod login;

use std::sync::Arc;

use axum::Router;

use crate::service::AuthService;

/// Shared handler state.
pub type AppState = Arc<AuthService>;

/// Build the auth API router. Paths are relative to `/api`.
pub fn build_router(svc: Arc<AuthService>) -> Router {
    Router::new().merge(login::routes()).with_state(svc)
}
