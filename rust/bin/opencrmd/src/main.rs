//! `opencrmd`: the OpenCRM server binary.
//!
//! Usage:
//!   opencrmd -c <context-name-or-path> [--listen <addr>]
//!
//! The context name resolves to `/etc/opencrm/<name>.toml`.
//! If a path with `/` or `.` is given, it's used directly.

mod auth_middleware;
mod bootstrap;
mod config;
mod routes;

use std::sync::Arc;

use clap::Parser;
use tracing::info;

use auth::AuthModule;
use auth::service::AuthConfig;
use customer::CustomerModule;
use holiday::{DataGoKrSource, HolidayModule};
use worklog::WorkLogModule;

use config::ServerConfig;

/// OpenCRM server.
#[derive(Parser, Debug)]
#[command(name = "opencrmd", about = "OpenCRM server")]
struct Cli {
    /// Context name or path to config file.
    #[arg(short = 'c', long = "config", required = true)]
    config: String,

    /// Listen address (overrides the config file).
    #[arg(long = "listen")]
    listen: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    let config_path = ServerConfig::resolve_path(&cli.config);
    info!("Loading configuration from {}", config_path.display());
    let server_config = ServerConfig::load(&config_path)?;
    bootstrap::verify_config(&server_config)?;

    std::fs::create_dir_all(&server_config.storage.data_dir)?;
    let kv: Arc<dyn opencrm_kv::KVStore> = Arc::new(
        opencrm_kv::RedbStore::open(&server_config.db_path())
            .map_err(|e| anyhow::anyhow!("failed to open KV store: {}", e))?,
    );

    let auth_module = AuthModule::new(
        Arc::clone(&kv),
        AuthConfig {
            jwt_secret: server_config.jwt.secret.clone(),
            token_ttl_secs: server_config.jwt.expire_secs,
        },
    );
    bootstrap::ensure_admin_user(auth_module.service(), &server_config)?;

    let customer_module = CustomerModule::new(Arc::clone(&kv));
    let worklog_module = WorkLogModule::new(Arc::clone(&kv));
    let holiday_source = DataGoKrSource::new(server_config.holiday.clone())
        .map_err(|e| anyhow::anyhow!("failed to build holiday client: {}", e))?;
    let holiday_module = HolidayModule::new(Arc::new(holiday_source));

    let app = routes::build_router(
        auth_module.service().clone(),
        &[&auth_module, &customer_module, &worklog_module, &holiday_module],
    );

    let listen = cli.listen.unwrap_or(server_config.listen);
    let listener = tokio::net::TcpListener::bind(&listen).await?;
    info!("OpenCRM server listening on {}", listen);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for ctrl-c: {}", e);
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
