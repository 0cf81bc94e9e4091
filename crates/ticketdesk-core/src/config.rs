//! Application configuration management.
//!
//! This module handles loading and saving the application configuration:
//! API location, how the user identity is resolved, where the session token
//! is kept, and the last username used on the login form.
//!
//! Configuration is stored at `~/.config/ticketdesk/config.json`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::api::{DEFAULT_API_URL, DEFAULT_REQUEST_TIMEOUT_SECS};
use crate::auth::{FileTokenStore, IdentitySource, KeyringTokenStore, TokenStore};

/// Application name used for config/data directory paths
pub const APP_NAME: &str = "ticketdesk";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Environment variable overriding the API base URL
pub const API_URL_ENV: &str = "TICKETDESK_API_URL";

/// Where the session token is persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenBackend {
    #[default]
    File,
    Keyring,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub api_url: Option<String>,
    #[serde(default)]
    pub identity_source: IdentitySource,
    #[serde(default)]
    pub token_backend: TokenBackend,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
    #[serde(default)]
    pub last_username: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path).context("Failed to read config file")?;
            serde_json::from_str(&contents).context("Failed to parse config file")
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory for the token file and logs
    pub fn data_dir(&self) -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }

    /// API base URL: environment first, then config, then the default.
    pub fn api_url(&self) -> String {
        Self::pick_api_url(std::env::var(API_URL_ENV).ok(), self.api_url.clone())
    }

    fn pick_api_url(env: Option<String>, configured: Option<String>) -> String {
        env.into_iter()
            .chain(configured)
            .map(|u| u.trim().to_string())
            .find(|u| !u.is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.request_timeout_secs
                .filter(|s| *s > 0)
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        )
    }

    /// Open the configured token store
    pub fn token_store(&self) -> Result<Box<dyn TokenStore>> {
        Ok(match self.token_backend {
            TokenBackend::File => Box::new(FileTokenStore::new(self.data_dir()?)),
            TokenBackend::Keyring => Box::new(KeyringTokenStore::new()?),
        })
    }
}
