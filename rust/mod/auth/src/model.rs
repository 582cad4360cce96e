use serde::{Deserialize, Serialize};

use opencrm_core::{new_id, now_rfc3339};
use opencrm_store::KvRecord;

/// A login account. Only used to issue session tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique identifier (UUIDv4, no dashes). Carried as the token subject.
    #[serde(default)]
    pub id: String,

    pub username: String,

    /// argon2id PHC string.
    pub password_hash: String,

    #[serde(default)]
    pub created_at: String,
}

impl KvRecord for User {
    const RESOURCE: &'static str = "user";

    fn kv_prefix() -> &'static str {
        "crm:user:"
    }

    fn key_value(&self) -> String {
        self.username.clone()
    }

    fn before_create(&mut self) {
        if self.id.is_empty() {
            self.id = new_id();
        }
        self.created_at = now_rfc3339();
    }
}

/// JWT claims carried by every session token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// User id.
    pub sub: String,
    /// Username.
    pub name: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    /// Token lifetime in seconds.
    pub expires_in: u64,
}
