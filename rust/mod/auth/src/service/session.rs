use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};

use opencrm_core::ServiceError;

use crate::model::{Claims, LoginResponse, User};
use crate::service::AuthService;

impl AuthService {
    /// Sign a session token for a user.
    pub fn issue_token(&self, user: &User) -> Result<LoginResponse, ServiceError> {
        let now = chrono::Utc::now().timestamp();
        let exp = i64::try_from(self.config.token_ttl_secs)
            .ok()
            .and_then(|ttl| now.checked_add(ttl))
            .ok_or_else(|| ServiceError::Internal("token lifetime out of range".into()))?;
        let claims = Claims {
            sub: user.id.clone(),
            name: user.username.clone(),
            iat: now,
            exp,
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| ServiceError::Internal(format!("JWT encode failed: {}", e)))?;

        Ok(LoginResponse {
            token,
            expires_in: self.config.token_ttl_secs,
        })
    }

    /// Verify a session token's signature and expiry.
    pub fn verify_token(&self, token: &str) -> Result<Claims, ServiceError> {
        let mut validation = Validation::default();
        validation.leeway = 0;

        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|e| ServiceError::Unauthorized(format!("invalid token: {}", e)))
    }
}
