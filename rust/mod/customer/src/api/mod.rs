mod customers;
mod import;

use std::sync::Arc;

use axum::Router;

use crate::service::CustomerService;

/// Shared handler state.
pub type AppState = Arc<CustomerService>;

/// Build the customer API router. Paths are relative to `/api`.
pub fn build_router(svc: Arc<CustomerService>) -> Router {
    Router::new()
        .merge(customers::routes())
        .merge(import::routes())
        .with_state(svc)
}
