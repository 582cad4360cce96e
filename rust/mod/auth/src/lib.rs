//! Auth module: login accounts, argon2id password hashing and JWT session
//! tokens.
//!
//! ```ignore
//! use auth::{AuthModule, service::AuthConfig};
//!
//! let module = AuthModule::new(kv, AuthConfig::default());
//! let claims = module.service().verify_token(token)?;
//! ```

pub mod api;
pub mod model;
pub mod service;

use std::sync::Arc;

use axum::Router;

use opencrm_core::Module;
use opencrm_kv::KVStore;

use crate::service::{AuthConfig, AuthService};

pub use model::{Claims, LoginRequest, LoginResponse, User};

pub struct AuthModule {
    service: Arc<AuthService>,
}

impl AuthModule {
    pub fn new(kv: Arc<dyn KVStore>, config: AuthConfig) -> Self {
        Self { service: AuthService::new(kv, config) }
    }

    pub fn service(&self) -> &Arc<AuthService> {
        &self.service
    }
}

impl Module for AuthModule {
    fn name(&self) -> &str {
        "auth"
    }

    fn routes(&self) -> Router {
        api::build_router(self.service.clone())
    }
}
