//! `~/.opencrm/config.toml`: the contexts the CLI knows about and which one
//! is selected.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result, bail};
use serde::{Deserialize, Serialize};

/// One opencrmd instance plus the session token issued by it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Context {
    pub name: String,

    /// Server config written by `opencrm context create`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub config_path: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub server: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub token: String,
}

impl Context {
    /// Point the context at another server. A token from the old server is
    /// dropped. Returns true when the URL changed.
    pub fn set_server(&mut self, server: &str) -> bool {
        if self.server == server {
            return false;
        }
        self.server = server.to_string();
        self.token.clear();
        true
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(rename = "current-context", default)]
    pub current_context: String,

    #[serde(default)]
    pub contexts: Vec<Context>,
}

/// `$HOME/.opencrm/config.toml`.
pub fn default_path() -> PathBuf {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".opencrm").join("config.toml")
}

impl ClientConfig {
    /// A missing file is an empty config.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, toml::to_string_pretty(self)?).with_context(|| format!("writing {}", path.display()))
    }

    pub fn current(&self) -> Option<&Context> {
        self.contexts.iter().find(|c| c.name == self.current_context)
    }

    /// The selected context, for commands that store a token in it.
    pub fn current_mut(&mut self) -> Result<&mut Context> {
        if self.current_context.is_empty() {
            bail!("No current context. Run `opencrm use context <name>`.");
        }
        let name = self.current_context.clone();
        self.context_mut(&name)
    }

    pub fn context_mut(&mut self, name: &str) -> Result<&mut Context> {
        self.contexts
            .iter_mut()
            .find(|c| c.name == name)
            .ok_or_else(|| anyhow::anyhow!("Context \"{}\" not found.", name))
    }

    /// Register a context, replacing one with the same name. The first
    /// context added becomes the current one.
    pub fn add_context(&mut self, ctx: Context) {
        if self.current_context.is_empty() {
            self.current_context = ctx.name.clone();
        }
        match self.contexts.iter_mut().find(|c| c.name == ctx.name) {
            Some(existing) => *existing = ctx,
            None => self.contexts.push(ctx),
        }
    }

    pub fn select(&mut self, name: &str) -> Result<()> {
        if !self.contexts.iter().any(|c| c.name == name) {
            bail!("Context \"{}\" not found. Run `opencrm context list` to see available contexts.", name);
        }
        self.current_context = name.to_string();
        Ok(())
    }

    /// Returns true if the context existed. Removing the current context
    /// leaves none selected.
    pub fn remove_context(&mut self, name: &str) -> bool {
        let before = self.contexts.len();
        self.contexts.retain(|c| c.name != name);
        if self.current_context == name {
            self.current_context.clear();
        }
        self.contexts.len() < before
    }
}
