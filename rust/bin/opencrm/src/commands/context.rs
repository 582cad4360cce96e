//! Context management commands.

use std::path::{Path, PathBuf};

use anyhow::Result;
use rand::Rng;

use crate::config::{ClientConfig, Context};

/// Options for `opencrm context create`.
pub struct CreateOptions<'a> {
    pub name: &'a str,
    pub config_dir: &'a str,
    pub data_dir: &'a str,
    pub server: Option<&'a str>,
    pub admin: &'a str,
    pub password: &'a str,
}

/// Create a new context: write a server config with a fresh JWT secret and
/// the hashed admin password, then register it in the client config.
pub fn create(opts: &CreateOptions<'_>, client_config_path: &Path) -> Result<()> {
    let password_hash = auth::service::hash_password(opts.password)?;
    let jwt_secret = random_secret();
    let server_config = server_config_toml(opts.data_dir, &jwt_secret, opts.admin, &password_hash);

    let config_path = PathBuf::from(opts.config_dir).join(format!("{}.toml", opts.name));
    std::fs::create_dir_all(opts.config_dir)?;
    std::fs::write(&config_path, &server_config)?;
    std::fs::create_dir_all(opts.data_dir)?;

    let mut client_config = ClientConfig::load(client_config_path)?;
    client_config.add_context(Context {
        name: opts.name.to_string(),
        config_path: config_path.to_string_lossy().to_string(),
        server: opts.server.unwrap_or_default().to_string(),
        token: String::new(),
    });
    client_config.save(client_config_path)?;

    println!("Context \"{}\" created.", opts.name);
    println!("  Config: {}", config_path.display());
    println!("  Data:   {}", opts.data_dir);
    Ok(())
}

/// 32 random bytes as hex.
fn random_secret() -> String {
    let mut rng = rand::thread_rng();
    (0..32).map(|_| format!("{:02x}", rng.r#gen::<u8>())).collect()
}

fn server_config_toml(data_dir: &str, jwt_secret: &str, admin: &str, password_hash: &str) -> String {
    format!(
        r#"listen = "0.0.0.0:5000"

[storage]
data_dir = "{data_dir}"

[jwt]
secret = "{jwt_secret}"
expire_secs = 3600

[admin]
username = "{admin}"
password_hash = "{password_hash}"
"#
    )
}

pub fn list(client_config_path: &Path) -> Result<()> {
    let config = ClientConfig::load(client_config_path)?;

    if config.contexts.is_empty() {
        println!("No contexts configured.");
        println!("Run: opencrm context create <name>");
        return Ok(());
    }

    println!("{:2} {:20} {:40} {:8}", "", "NAME", "SERVER", "LOGIN");
    for ctx in &config.contexts {
        let marker = if ctx.name == config.current_context { "*" } else { " " };
        let server = if ctx.server.is_empty() { "-" } else { &ctx.server };
        let login = if ctx.token.is_empty() { "no" } else { "yes" };
        println!("{:2} {:20} {:40} {:8}", marker, ctx.name, server, login);
    }
    Ok(())
}

pub fn use_context(name: &str, client_config_path: &Path) -> Result<()> {
    let mut config = ClientConfig::load(client_config_path)?;
    config.select(name)?;
    config.save(client_config_path)?;
    println!("Switched to context \"{}\".", name);
    Ok(())
}

pub fn set(name: &str, server: Option<&str>, client_config_path: &Path) -> Result<()> {
    let mut config = ClientConfig::load(client_config_path)?;

    let ctx = config.context_mut(name)?;
    if let Some(s) = server {
        if ctx.set_server(s) {
            tracing::debug!(context = name, "server changed, session token dropped");
        }
    }

    config.save(client_config_path)?;
    println!("Context \"{}\" updated.", name);
    Ok(())
}

/// Delete a context. The server config file is left in place.
pub fn delete(name: &str, client_config_path: &Path) -> Result<()> {
    let mut config = ClientConfig::load(client_config_path)?;

    if !config.remove_context(name) {
        anyhow::bail!("Context \"{}\" not found.", name);
    }

    config.save(client_config_path)?;
    println!("Context \"{}\" deleted.", name);
    Ok(())
}
