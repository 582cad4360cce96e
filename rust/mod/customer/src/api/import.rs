use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde::Serialize;
use serde_json::Value;

use opencrm_core::ServiceError;

use crate::api::AppState;
use crate::service::import::parse_batch;
use crate::service::{ImportMode, ImportTally};

/// Request body cap for bulk imports. A whole spreadsheet arrives in one
/// request, and a single row may carry two full-length memos.
pub const IMPORT_BODY_LIMIT: usize = 50 * 1024 * 1024;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/customers/replace", post(replace_customers))
        .route("/customers/add", post(add_customers))
        .layer(DefaultBodyLimit::max(IMPORT_BODY_LIMIT))
}

#[derive(Serialize)]
struct ImportResponse {
    message: String,
    #[serde(flatten)]
    tally: ImportTally,
}

async fn replace_customers(
    State(svc): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<ImportResponse>), ServiceError> {
    run_import(svc, ImportMode::Replace, payload).await
}

async fn add_customers(
    State(svc): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<ImportResponse>), ServiceError> {
    run_import(svc, ImportMode::Append, payload).await
}

/// The batch is a run of synchronous store writes under the service's
/// write lock, so it goes to the blocking pool.
async fn run_import(
    svc: AppState,
    mode: ImportMode,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<ImportResponse>), ServiceError> {
    let Json(payload) = payload?;
    let rows = parse_batch(payload)?;
    let tally = tokio::task::spawn_blocking(move || svc.import(mode, rows))
        .await
        .map_err(|e| ServiceError::Internal(format!("import task failed: {}", e)))??;

    Ok((
        StatusCode::CREATED,
        Json(ImportResponse {
            message: format!("{} import complete", mode.as_str()),
            tally,
        }),
    ))
}
