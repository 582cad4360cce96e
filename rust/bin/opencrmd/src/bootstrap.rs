//! Startup checks and first-run initialization.

use anyhow::bail;

use auth::service::{AuthService, MAX_TOKEN_TTL_SECS};

use crate::config::ServerConfig;

/// Refuse to start with a config that cannot work.
pub fn verify_config(config: &ServerConfig) -> anyhow::Result<()> {
    if config.storage.data_dir.trim().is_empty() {
        bail!("storage.data_dir must be set");
    }
    if config.jwt.secret.is_empty() {
        bail!("jwt.secret must be set; run `opencrm context create` to generate one");
    }
    if config.jwt.expire_secs == 0 {
        bail!("jwt.expire_secs must be positive");
    }
    if config.jwt.expire_secs > MAX_TOKEN_TTL_SECS {
        bail!("jwt.expire_secs must be at most {MAX_TOKEN_TTL_SECS} (one year)");
    }
    if config.admin.password_hash.is_empty() {
        tracing::warn!("admin.password_hash is empty; no bootstrap account will be created");
    } else if config.admin.username.trim().is_empty() {
        bail!("admin.username must be set when admin.password_hash is");
    }
    if config.holiday.service_key.is_empty() {
        tracing::warn!("holiday.service_key is empty; /api/holidays will fail upstream");
    }
    Ok(())
}

/// Create the configured admin account if it does not exist yet.
pub fn ensure_admin_user(auth: &AuthService, config: &ServerConfig) -> anyhow::Result<()> {
    if config.admin.password_hash.is_empty() {
        return Ok(());
    }
    let created = auth
        .ensure_user(&config.admin.username, &config.admin.password_hash)
        .map_err(|e| anyhow::anyhow!("failed to bootstrap admin user: {}", e))?;
    if !created {
        tracing::debug!(username = %config.admin.username, "admin user already exists");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ServerConfig {
        ServerConfig::parse(
            r#"
[storage]
data_dir = "/tmp/crm"

[jwt]
secret = "test"
"#,
        )
        .unwrap()
    }

    #[test]
    fn verify_config_empty_secret() {
        let mut c = config();
        assert!(verify_config(&c).is_ok());
        c.jwt.secret.clear();
        assert!(verify_config(&c).is_err());
    }

    #[test]
    fn verify_config_admin_without_username() {
        let mut c = config();
        c.admin.password_hash = "$argon2id$...".into();
        c.admin.username = " ".into();
        assert!(verify_config(&c).is_err());
    }

    #[test]
    fn verify_config_empty_data_dir() {
        let mut c = config();
        c.storage.data_dir = String::new();
        assert!(verify_config(&c).is_err());
    }

    #[test]
    fn verify_config_expire_secs_bounds() {
        let mut c = config();
        c.jwt.expire_secs = 0;
        assert!(verify_config(&c).is_err());
        c.jwt.expire_secs = MAX_TOKEN_TTL_SECS;
        assert!(verify_config(&c).is_ok());
        c.jwt.expire_secs = MAX_TOKEN_TTL_SECS + 1;
        assert!(verify_config(&c).is_err());
        c.jwt.expire_secs = u64::MAX;
        assert!(verify_config(&c).is_err());
    }
}
