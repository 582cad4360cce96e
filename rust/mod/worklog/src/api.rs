use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Extension, Json, Router};
use serde_json::{Value, json};

use auth::Claims;
use opencrm_core::ServiceError;

use crate::model::{SaveWorkLog, UpdateWorkLog, WorkLog};
use crate::service::WorkLogService;

/// Shared handler state.
pub type AppState = Arc<WorkLogService>;

/// Build the work log router. Paths are relative to `/api`.
///
/// Every handler reads the caller from the [`Claims`] extension that the
/// server's auth middleware inserts.
pub fn build_router(svc: Arc<WorkLogService>) -> Router {
    Router::new()
        .route("/worklog", get(list_entries).post(save_entry))
        .route(
            "/worklog/{date}",
            get(get_entry).put(update_entry).delete(delete_entry),
        )
        .with_state(svc)
}

async fn list_entries(
    State(svc): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<WorkLog>>, ServiceError> {
    Ok(Json(svc.list(&claims.sub)?))
}

/// A day without an entry answers with an empty log, not 404.
async fn get_entry(
    State(svc): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(date): Path<String>,
) -> Result<Json<Value>, ServiceError> {
    let body = match svc.get(&claims.sub, &date)? {
        Some(entry) => serde_json::to_value(entry).map_err(|e| ServiceError::Internal(e.to_string()))?,
        None => json!({"date": date, "log": ""}),
    };
    Ok(Json(body))
}

async fn save_entry(
    State(svc): State<AppState>,
    Extension(claims): Extension<Claims>,
    body: Result<Json<SaveWorkLog>, JsonRejection>,
) -> Result<Json<WorkLog>, ServiceError> {
    let Json(input) = body?;
    Ok(Json(svc.save(&claims.sub, input)?))
}

async fn update_entry(
    State(svc): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(date): Path<String>,
    body: Result<Json<UpdateWorkLog>, JsonRejection>,
) -> Result<Json<WorkLog>, ServiceError> {
    let Json(input) = body?;
    Ok(Json(svc.update(&claims.sub, &date, input.log)?))
}

async fn delete_entry(
    State(svc): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(date): Path<String>,
) -> Result<Json<Value>, ServiceError> {
    svc.delete(&claims.sub, &date)?;
    Ok(Json(json!({"message": format!("work log for {} deleted", date)})))
}
