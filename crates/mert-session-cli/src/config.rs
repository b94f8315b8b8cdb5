/*
[INPUT]:  YAML configuration file
[OUTPUT]: Parsed CLI configuration and derived client/controller settings
[POS]:    Configuration layer - session client setup
[UPDATE]: When adding new configuration options
*/

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use mert_session_adapter::auth::DEFAULT_APP_NAME;
use mert_session_adapter::http::DEFAULT_BASE_URL;
use mert_session_adapter::{ClientConfig, ControllerConfig};
use serde::{Deserialize, Serialize};

use crate::i18n::Locale;

/// Top-level configuration for the session client
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CliConfig {
    /// Application name embedded in the wallet challenge
    pub app_name: String,
    /// Backend base URL, including the `/api` prefix
    pub api_base_url: String,
    /// Language for user-facing messages
    pub locale: Locale,
    /// Where the session token is persisted (defaults to the user data dir)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_file: Option<PathBuf>,
    /// Directory for daily rolling log files; stderr only when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,
    /// HTTP request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            app_name: DEFAULT_APP_NAME.to_string(),
            api_base_url: DEFAULT_BASE_URL.to_string(),
            locale: Locale::default(),
            session_file: None,
            log_dir: None,
            timeout_secs: 30,
        }
    }
}

impl CliConfig {
    /// Load configuration from YAML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        let config: Self = serde_yaml::from_str(&content)
            .with_context(|| format!("parse config {}", path.display()))?;
        Ok(config)
    }

    /// Load `path` if given, else the default location if it exists, else defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::from_file(path);
        }
        match default_config_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.app_name.trim().is_empty() {
            bail!("app_name cannot be empty");
        }
        let url = self.api_base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            bail!("api_base_url must be an http(s) URL, got {url:?}");
        }
        if self.timeout_secs == 0 {
            bail!("timeout_secs must be greater than zero");
        }
        Ok(())
    }

    pub fn session_path(&self) -> Result<PathBuf> {
        match &self.session_file {
            Some(path) => Ok(path.clone()),
            None => Ok(data_dir()?.join("session.json")),
        }
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.api_base_url.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
            ..ClientConfig::default()
        }
    }

    pub fn controller_config(&self) -> ControllerConfig {
        ControllerConfig {
            app_name: self.app_name.clone(),
        }
    }
}

/// `<config dir>/mert-session/config.yaml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("mert-session").join("config.yaml"))
}

fn data_dir() -> Result<PathBuf> {
    dirs::data_dir()
        .map(|dir| dir.join("mert-session"))
        .ok_or_else(|| anyhow!("Could not determine data directory"))
}
