use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::routing::post;
use axum::{Json, Router};

use opencrm_core::ServiceError;

use crate::api::AppState;
use crate::model::{LoginRequest, LoginResponse};

pub fn routes() -> Router<AppState> {
    Router::new().route("/auth/login", post(login))
}

async fn login(
    State(svc): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ServiceError> {
    let Json(req) = body?;
    Ok(Json(svc.login(&req)?))
}
