use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::Value;

use opencrm_core::{ListParams, ServiceError};

use crate::api::AppState;
use crate::model::Customer;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/customers", get(list_customers).post(create_customer))
        .route(
            "/customers/{id}",
            get(get_customer).patch(update_customer).delete(delete_customer),
        )
}

async fn list_customers(
    State(svc): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<Vec<Customer>>, ServiceError> {
    let Query(params) = params?;
    Ok(Json(svc.list(&params)?))
}

async fn create_customer(
    State(svc): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Customer>), ServiceError> {
    let Json(body) = body?;
    let customer = svc.create(&body)?;
    Ok((StatusCode::CREATED, Json(customer)))
}

async fn get_customer(
    State(svc): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Customer>, ServiceError> {
    Ok(Json(svc.get(&id)?))
}

async fn update_customer(
    State(svc): State<AppState>,
    Path(id): Path<String>,
    patch: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Customer>, ServiceError> {
    let Json(patch) = patch?;
    Ok(Json(svc.update(&id, &patch)?))
}

async fn delete_customer(
    State(svc): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ServiceError> {
    let removed = svc.delete(&id)?;
    Ok(Json(serde_json::json!({
        "message": format!("customer {} deleted", removed.serial_no),
    })))
}
