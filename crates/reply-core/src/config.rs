//! Application configuration management.
//!
//! Configuration is resolved once at startup from three layers, later layers
//! winning:
//!
//! 1. built-in defaults,
//! 2. `~/.config/reply/config.json`,
//! 3. environment variables (`REPLY_API_URL`, `REPLY_GOOGLE_CLIENT_ID`,
//!    `REPLY_REDIRECT_URI`, `REPLY_CREDENTIAL_STORE`), including those loaded
//!    from a `.env` file by the binary.

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Application name used for config directory paths
pub const APP_NAME: &str = "reply";

/// Config file name
const CONFIG_FILE: &str = "config.json";

pub const DEFAULT_API_URL: &str = "https://reply-platform-api.red-frog-895a.workers.dev";
pub const DEFAULT_REDIRECT_URI: &str = "http://localhost:9876/auth/callback";

pub const ENV_API_URL: &str = "REPLY_API_URL";
pub const ENV_GOOGLE_CLIENT_ID: &str = "REPLY_GOOGLE_CLIENT_ID";
pub const ENV_REDIRECT_URI: &str = "REPLY_REDIRECT_URI";
pub const ENV_CREDENTIAL_STORE: &str = "REPLY_CREDENTIAL_STORE";

/// Where the session credential is persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CredentialStoreKind {
    /// OS keychain
    Keyring,
    /// `session.json` in the config directory
    #[default]
    File,
    /// Process memory only; nothing survives exit
    Memory,
}

impl FromStr for CredentialStoreKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "keyring" => Ok(Self::Keyring),
            "file" => Ok(Self::File),
            "memory" => Ok(Self::Memory),
            other => Err(anyhow::anyhow!("Unknown credential store: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Backend base URL
    pub api_url: String,
    /// Google OAuth client identifier
    pub oauth_client_id: String,
    /// Redirect URI registered with Google for this client
    pub oauth_redirect_uri: String,
    pub credential_store: CredentialStoreKind,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            oauth_client_id: String::new(),
            oauth_redirect_uri: DEFAULT_REDIRECT_URI.to_string(),
            credential_store: CredentialStoreKind::default(),
        }
    }
}

impl Config {
    /// Resolve the full configuration: defaults, then file, then environment
    pub fn load() -> Result<Self> {
        let mut config = Self::load_file()?;
        config.apply_env(|key| std::env::var(key).ok());
        debug!(api_url = %config.api_url, store = ?config.credential_store, "Configuration loaded");
        Ok(config)
    }

    /// Load only the config file layer (defaults when the file is absent)
    pub fn load_file() -> Result<Self> {
        match Self::config_path() {
            Ok(path) if path.exists() => {
                let contents = std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                serde_json::from_str(&contents)
                    .with_context(|| format!("Failed to parse {}", path.display()))
            }
            Ok(_) => Ok(Self::default()),
            Err(e) => {
                warn!(error = %e, "No config directory, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Overlay environment values. Empty values count as unset.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get(ENV_API_URL) {
            self.api_url = url;
        }
        if let Some(client_id) = get(ENV_GOOGLE_CLIENT_ID) {
            self.oauth_client_id = client_id;
        }
        if let Some(redirect) = get(ENV_REDIRECT_URI) {
            self.oauth_redirect_uri = redirect;
        }
        if let Some(store) = get(ENV_CREDENTIAL_STORE) {
            match store.parse() {
                Ok(kind) => self.credential_store = kind,
                Err(e) => warn!(error = %e, "Ignoring {}", ENV_CREDENTIAL_STORE),
            }
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(CONFIG_FILE))
    }

    /// Per-user directory holding `config.json` and, for the file store, `session.json`
    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME))
    }
}
