//! Public holiday lookup, proxied from a third-party service so the
//! browser never sees the service key.
//!
//! Route (relative to `/api`, no session required): `GET /holidays/{year}`.

pub mod source;

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};

use opencrm_core::{Module, ServiceError};

pub use source::{DataGoKrSource, Holiday, HolidayConfig, HolidayError, HolidaySource};

pub struct HolidayModule {
    source: Arc<dyn HolidaySource>,
}

impl HolidayModule {
    pub fn new(source: Arc<dyn HolidaySource>) -> Self {
        Self { source }
    }
}

impl Module for HolidayModule {
    fn name(&self) -> &str {
        "holiday"
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/holidays/{year}", get(list_holidays))
            .with_state(self.source.clone())
    }
}

async fn list_holidays(
    State(source): State<Arc<dyn HolidaySource>>,
    Path(year): Path<String>,
) -> Result<Json<Vec<Holiday>>, ServiceError> {
    let year: u16 = year
        .parse()
        .map_err(|_| ServiceError::Validation(format!("invalid year '{}'", year)))?;

    source.holidays(year).await.map(Json).map_err(|e| {
        tracing::error!(year, error = %e, "holiday lookup failed");
        ServiceError::Upstream("error fetching holidays".into())
    })
}
