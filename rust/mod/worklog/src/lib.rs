//! Work log module: one free-text entry per user per calendar date.
//!
//! Routes (relative to `/api`): `GET/POST /worklog`,
//! `GET/PUT/DELETE /worklog/{date}`.

pub mod api;
pub mod model;
pub mod service;

use std::sync::Arc;

use axum::Router;

use opencrm_core::Module;
use opencrm_kv::KVStore;

use crate::service::WorkLogService;

pub use model::WorkLog;

pub struct WorkLogModule {
    service: Arc<WorkLogService>,
}

impl WorkLogModule {
    pub fn new(kv: Arc<dyn KVStore>) -> Self {
        Self { service: WorkLogService::new(kv) }
    }
}

impl Module for WorkLogModule {
    fn name(&self) -> &str {
        "worklog"
    }

    fn routes(&self) -> Router {
        api::build_router(self.service.clone())
    }
}
