// src/config.rs
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const ACCOUNT_SID_ENV: &str = "CHANMSG_ACCOUNT_SID";
pub const AUTH_TOKEN_ENV: &str = "CHANMSG_AUTH_TOKEN";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Account identifier, used as the Basic auth user name
    #[serde(default)]
    pub account_sid: String,

    /// Auth token, used as the Basic auth password
    #[serde(default)]
    pub auth_token: String,

    /// Service root that relative paths are joined to
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds (0 = no timeout)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Append one line per request to this file
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

fn default_base_url() -> String {
    "https://chat.twilio.com/v1".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            account_sid: String::new(),
            auth_token: String::new(),
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            log_file: None,
        }
    }
}

impl ClientConfig {
    /// Override credentials from the environment. Only variables that are set win.
    pub fn apply_env(&mut self) {
        self.apply_overrides(
            std::env::var(ACCOUNT_SID_ENV).ok(),
            std::env::var(AUTH_TOKEN_ENV).ok(),
        );
    }

    fn apply_overrides(&mut self, account_sid: Option<String>, auth_token: Option<String>) {
        if let Some(sid) = account_sid.filter(|s| !s.is_empty()) {
            self.account_sid = sid;
        }
        if let Some(token) = auth_token.filter(|s| !s.is_empty()) {
            self.auth_token = token;
        }
    }

    /// Fail early when credentials are missing instead of sending unauthenticated requests.
    pub fn validate(&self) -> Result<()> {
        if self.account_sid.is_empty() {
            anyhow::bail!("account_sid is not set (config file or {ACCOUNT_SID_ENV})");
        }
        if self.auth_token.is_empty() {
            anyhow::bail!("auth_token is not set (config file or {AUTH_TOKEN_ENV})");
        }
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            anyhow::bail!("base_url must be an http(s) URL, got '{}'", self.base_url);
        }
        Ok(())
    }
}

pub fn config_path(dir: &Path) -> PathBuf {
    dir.join("chanmsg.toml")
}

pub fn load_config(path: &Path) -> Result<Option<ClientConfig>> {
    if !path.exists() {
        return Ok(None);
    }
    let contents = std::fs::read_to_string(path)?;
    let config: ClientConfig = toml::from_str(&contents)?;
    Ok(Some(config))
}

pub fn save_config(path: &Path, config: &ClientConfig) -> Result<()> {
    let toml = toml::to_string_pretty(config)?;
    std::fs::write(path, toml)?;
    Ok(())
}
