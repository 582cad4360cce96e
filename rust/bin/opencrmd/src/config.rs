//! Server configuration, loaded from a TOML file.
//!
//! ```toml
//! listen = "0.0.0.0:5000"
//!
//! [storage]
//! data_dir = "/var/lib/opencrm/prod"
//!
//! [jwt]
//! secret = "..."
//! expire_secs = 3600
//!
//! [admin]
//! username = "admin"
//! password_hash = "$argon2id$..."
//!
//! [holiday]
//! service_key = "..."
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use holiday::HolidayConfig;

/// Env var that overrides `[holiday] service_key`.
pub const HOLIDAY_KEY_ENV: &str = "OPENCRM_HOLIDAY_SERVICE_KEY";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen")]
    pub listen: String,
    pub storage: StorageConfig,
    pub jwt: JwtConfig,
    #[serde(default)]
    pub admin: AdminConfig,
    #[serde(default)]
    pub holiday: HolidayConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    #[serde(default = "default_expire_secs")]
    pub expire_secs: u64,
}

/// Account created on first start if it does not exist yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    #[serde(default = "default_admin")]
    pub username: String,
    /// argon2id PHC string. Empty disables the bootstrap account.
    #[serde(default)]
    pub password_hash: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            username: default_admin(),
            password_hash: String::new(),
        }
    }
}

fn default_listen() -> String {
    "0.0.0.0:5000".to_string()
}

fn default_expire_secs() -> u64 {
    3600
}

fn default_admin() -> String {
    "admin".to_string()
}

impl ServerConfig {
    /// Resolve `-c` into a file path: a bare name means
    /// `/etc/opencrm/<name>.toml`, anything with `/` or `.` is a path.
    pub fn resolve_path(name_or_path: &str) -> PathBuf {
        if name_or_path.contains('/') || name_or_path.contains('.') {
            PathBuf::from(name_or_path)
        } else {
            PathBuf::from("/etc/opencrm").join(format!("{}.toml", name_or_path))
        }
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read {}: {}", path.display(), e))?;
        let mut config = Self::parse(&content)?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Apply environment overrides. `lookup` is `std::env::var` outside tests.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup(HOLIDAY_KEY_ENV).filter(|k| !k.is_empty()) {
            self.holiday.service_key = key;
        }
    }

    /// Path of the redb file.
    pub fn db_path(&self) -> PathBuf {
        PathBuf::from(&self.storage.data_dir).join("opencrm.redb")
    }
}
