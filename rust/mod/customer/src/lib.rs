//! Customer module: contact records, serial number allocation and bulk
//! spreadsheet import.
//!
//! # Routes (relative to `/api`)
//!
//! - `GET/POST /customers`
//! - `GET/PATCH/DELETE /customers/{id}`
//! - `POST /customers/replace`, `POST /customers/add`

pub mod api;
pub mod model;
pub mod service;

use std::sync::Arc;

use axum::Router;

use opencrm_core::Module;
use opencrm_kv::KVStore;

use crate::service::CustomerService;

pub use model::{Customer, FIELDS, FieldSpec, RowError};
pub use service::{ImportMode, ImportTally};

pub struct CustomerModule {
    service: Arc<CustomerService>,
}

impl CustomerModule {
    pub fn new(kv: Arc<dyn KVStore>) -> Self {
        Self { service: CustomerService::new(kv) }
    }

    pub fn service(&self) -> &Arc<CustomerService> {
        &self.service
    }
}

impl Module for CustomerModule {
    fn name(&self) -> &str {
        "customer"
    }

    fn routes(&self) -> Router {
        api::build_router(self.service.clone())
    }
}
