pub mod password;
pub mod session;

use std::sync::Arc;

use opencrm_core::ServiceError;
use opencrm_kv::KVStore;
use opencrm_store::KvOps;

use crate::model::{LoginRequest, LoginResponse, User};

pub use password::{hash_password, verify_password};

/// Longest session token lifetime accepted (one year).
pub const MAX_TOKEN_TTL_SECS: u64 = 365 * 24 * 3600;

/// Configuration for the auth service.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// JWT signing secret.
    pub jwt_secret: String,
    /// Session token lifetime in seconds (default: 1h).
    pub token_ttl_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "opencrm-dev-secret-change-me".to_string(),
            token_ttl_secs: 3600,
        }
    }
}

/// Login accounts and session tokens.
pub struct AuthService {
    pub(crate) users: KvOps<User>,
    pub(crate) config: AuthConfig,
}

const BAD_CREDENTIALS: &str = "invalid username or password";

impl AuthService {
    pub fn new(kv: Arc<dyn KVStore>, config: AuthConfig) -> Arc<Self> {
        Arc::new(Self {
            users: KvOps::new(kv),
            config,
        })
    }

    /// Exchange a username/password pair for a session token.
    ///
    /// Unknown users and wrong passwords get the same 400 response.
    pub fn login(&self, req: &LoginRequest) -> Result<LoginResponse, ServiceError> {
        let Some(user) = self.users.get(&req.username)? else {
            tracing::warn!(username = %req.username, "login failed: unknown user");
            return Err(ServiceError::Validation(BAD_CREDENTIALS.into()));
        };
        if !verify_password(&req.password, &user.password_hash) {
            tracing::warn!(username = %req.username, "login failed: bad password");
            return Err(ServiceError::Validation(BAD_CREDENTIALS.into()));
        }

        let resp = self.issue_token(&user)?;
        tracing::info!(username = %user.username, user_id = %user.id, "login succeeded");
        Ok(resp)
    }

    /// Create a user with an already hashed password.
    pub fn create_user(&self, username: &str, password_hash: &str) -> Result<User, ServiceError> {
        if username.trim().is_empty() {
            return Err(ServiceError::Validation("username is required".into()));
        }
        self.users.save_new(User {
            id: String::new(),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            created_at: String::new(),
        })
    }

    /// Make sure `username` exists, creating it with `password_hash` if not.
    /// An existing account is left untouched. Returns true when created.
    pub fn ensure_user(&self, username: &str, password_hash: &str) -> Result<bool, ServiceError> {
        if self.users.get(username)?.is_some() {
            return Ok(false);
        }
        self.create_user(username, password_hash)?;
        tracing::info!(username, "created bootstrap user");
        Ok(true)
    }

    pub fn get_user(&self, username: &str) -> Result<User, ServiceError> {
        self.users.get_or_err(username)
    }
}
