//! Login / logout commands.

use std::path::Path;

use anyhow::Result;

use crate::config::ClientConfig;

/// Log in to the current context's server and store the session token.
pub async fn login(username: &str, password: &str, client_config_path: &Path) -> Result<()> {
    let client = super::anonymous_client(client_config_path)?;
    let resp = client
        .login(username, password)
        .await
        .map_err(|e| anyhow::anyhow!("Login failed: {}", e))?;

    let mut config = ClientConfig::load(client_config_path)?;
    let ctx = config.current_mut()?;
    ctx.token = resp.token;
    let name = ctx.name.clone();
    config.save(client_config_path)?;

    println!("Logged in as {}.", username);
    println!("Token saved to context \"{}\" (expires in {}s).", name, resp.expires_in);
    Ok(())
}

/// Clear the token from the current context.
pub fn logout(client_config_path: &Path) -> Result<()> {
    let mut config = ClientConfig::load(client_config_path)?;
    let ctx = config.current_mut()?;
    ctx.token.clear();
    let name = ctx.name.clone();
    config.save(client_config_path)?;
    println!("Logged out from context \"{}\".", name);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Context;

    #[test]
    fn logout_clears_token() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("client.toml");
        let mut config = ClientConfig::default();
        config.add_context(Context {
            name: "a".to_string(),
            token: "tok".to_string(),
            ..Default::default()
        });
        config.save(&path).unwrap();

        logout(&path).unwrap();
        assert!(ClientConfig::load(&path).unwrap().contexts[0].token.is_empty());
    }

    #[test]
    fn logout_without_context_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(logout(&dir.path().join("client.toml")).is_err());
    }
}
