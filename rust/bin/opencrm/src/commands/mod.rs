pub mod context;
pub mod customers;
pub mod holidays;
pub mod login;
pub mod worklog;

use std::path::Path;

use anyhow::Result;
use opencrm_client::CrmClient;

use crate::config::{ClientConfig, Context};

/// Current context, or an error telling the user how to pick one.
pub fn current_context(client_config_path: &Path) -> Result<Context> {
    let config = ClientConfig::load(client_config_path)?;
    config
        .current()
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("No current context. Run `opencrm use context <name>`."))
}

fn require_server(ctx: &Context) -> Result<()> {
    if ctx.server.is_empty() {
        anyhow::bail!(
            "No server URL set for context \"{}\". Run `opencrm context set {} --server <url>`.",
            ctx.name,
            ctx.name
        );
    }
    Ok(())
}

/// Client for the current context without a session token.
pub fn anonymous_client(client_config_path: &Path) -> Result<CrmClient> {
    let ctx = current_context(client_config_path)?;
    require_server(&ctx)?;
    Ok(CrmClient::new(ctx.server))
}

/// Client for the current context carrying its session token.
pub fn client(client_config_path: &Path) -> Result<CrmClient> {
    let ctx = current_context(client_config_path)?;
    require_server(&ctx)?;
    if ctx.token.is_empty() {
        anyhow::bail!("Not logged in to context \"{}\". Run `opencrm login`.", ctx.name);
    }
    Ok(CrmClient::new(ctx.server).with_token(ctx.token))
}

/// Ask for confirmation on stdin. Anything but `y` declines.
pub fn confirm(prompt: &str) -> Result<bool> {
    eprint!("{} [y/N]: ", prompt);
    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;
    Ok(answer.trim().eq_ignore_ascii_case("y"))
}

/// Read a JSON object from `--json` or `-f <file>`.
pub fn json_input(json: Option<String>, file: Option<String>) -> Result<serde_json::Value> {
    let body = match (json, file) {
        (_, Some(path)) => std::fs::read_to_string(&path)?,
        (Some(json), None) => json,
        (None, None) => anyhow::bail!("Provide --json or -f <file>."),
    };
    serde_json::from_str(&body).map_err(|e| anyhow::anyhow!("Invalid JSON: {}", e))
}
