//! Client configuration management.
//!
//! This module handles loading and saving the client configuration, which
//! includes the backend URL, the last used username, where the session token
//! is kept, and the timer mode.
//!
//! Configuration is stored at `~/.config/typesprint/config.json`. The
//! `TYPESPRINT_BACKEND_URL` environment variable overrides the backend URL.

use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::api::DEFAULT_BASE_URL;
use crate::auth::{FileTokenStore, KeyringTokenStore, TokenStore};
use crate::typing::TimerMode;

/// Application name used for config/cache directory paths
const APP_NAME: &str = "typesprint";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Environment variable overriding `backend_url`
pub const BACKEND_URL_ENV: &str = "TYPESPRINT_BACKEND_URL";

/// Where the session token is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TokenStoreKind {
    #[default]
    File,
    Keyring,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub backend_url: Option<String>,
    pub last_username: Option<String>,
    #[serde(default)]
    pub token_store: TokenStoreKind,
    #[serde(default)]
    pub timer: TimerMode,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
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

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    /// Backend URL: environment, then config file, then the default.
    pub fn backend_url(&self) -> String {
        Self::resolve_backend_url(std::env::var(BACKEND_URL_ENV).ok(), self.backend_url.as_deref())
    }

    fn resolve_backend_url(env: Option<String>, configured: Option<&str>) -> String {
        env.filter(|v| !v.trim().is_empty())
            .or_else(|| configured.map(str::to_string))
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
    }

    /// Build the configured token store.
    pub fn token_store(&self) -> Result<Box<dyn TokenStore>> {
        Ok(match self.token_store {
            TokenStoreKind::File => Box::new(FileTokenStore::new(self.cache_dir()?)),
            TokenStoreKind::Keyring => Box::new(KeyringTokenStore::new()),
        })
    }
}
