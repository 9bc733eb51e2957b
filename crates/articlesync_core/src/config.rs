use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const DEFAULT_API_HOST: &str = "qiita.com";
pub const DEFAULT_USER_AGENT: &str = "articlesync/0.2";
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
pub const CONFIG_FILENAME: &str = ".articlesync.toml";

pub const ACCESS_TOKEN_ENV: &str = "QIITA_ACCESS_TOKEN";
pub const API_HOST_ENV: &str = "ARTICLESYNC_API_HOST";
pub const USER_AGENT_ENV: &str = "ARTICLESYNC_USER_AGENT";
pub const ROOT_ENV: &str = "ARTICLESYNC_ROOT";

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct SyncConfig {
    #[serde(default)]
    pub api: ApiSection,
    #[serde(default)]
    pub local: LocalSection,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct ApiSection {
    pub host: Option<String>,
    pub user_agent: Option<String>,
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct LocalSection {
    pub root: Option<PathBuf>,
}

impl SyncConfig {
    /// Access token from the environment only; never read from config files.
    pub fn access_token(&self) -> Option<String> {
        env_value(ACCESS_TOKEN_ENV)
    }

    /// Resolve the API host: env > config > DEFAULT_API_HOST.
    pub fn api_host(&self) -> String {
        self.api_host_with(env_value)
    }

    /// Resolve user agent: env > config > DEFAULT_USER_AGENT.
    pub fn user_agent(&self) -> String {
        self.user_agent_with(env_value)
    }

    pub fn timeout_ms(&self) -> u64 {
        self.api.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS)
    }

    /// Resolve the local article root: env > config > `base`.
    /// Relative values are taken relative to `base`.
    pub fn root_dir(&self, base: &Path) -> PathBuf {
        self.root_dir_with(base, env_value)
    }

    fn api_host_with<F>(&self, lookup: F) -> String
    where
        F: Fn(&str) -> Option<String>,
    {
        lookup(API_HOST_ENV)
            .or_else(|| self.api.host.clone())
            .unwrap_or_else(|| DEFAULT_API_HOST.to_string())
    }

    fn user_agent_with<F>(&self, lookup: F) -> String
    where
        F: Fn(&str) -> Option<String>,
    {
        lookup(USER_AGENT_ENV)
            .or_else(|| self.api.user_agent.clone())
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string())
    }

    fn root_dir_with<F>(&self, base: &Path, lookup: F) -> PathBuf
    where
        F: Fn(&str) -> Option<String>,
    {
        let configured = lookup(ROOT_ENV)
            .map(PathBuf::from)
            .or_else(|| self.local.root.clone());
        match configured {
            Some(path) if path.is_absolute() => path,
            Some(path) => base.join(path),
            None => base.to_path_buf(),
        }
    }
}

/// Load a SyncConfig from TOML. Returns defaults if the file doesn't exist.
pub fn load_config(config_path: &Path) -> Result<SyncConfig> {
    if !config_path.exists() {
        return Ok(SyncConfig::default());
    }
    let content =
        fs::read_to_string(config_path).map_err(|source| Error::io(config_path, source))?;
    toml::from_str(&content).map_err(|source| Error::Config {
        path: config_path.to_path_buf(),
        source,
    })
}

fn env_value(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
