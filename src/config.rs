// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Configuration persistence for lmcascade
//!
//! Stores the plugin settings (company, authentication mode, feature flags)
//! in a config file. All lmcascade data is stored under ~/.lmcascade/:
//! - ~/.lmcascade/config.json - plugin settings
//! - ~/.lmcascade/log/ - rolling log files
//! - ~/.lmcascade/history - REPL command history
//!
//! Secrets may also come from the environment (`LM_BEARER_TOKEN`,
//! `LM_ACCESS_KEY`), which take precedence over the file.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::logicmonitor::auth::Credentials;

pub const ENV_BEARER_TOKEN: &str = "LM_BEARER_TOKEN";
pub const ENV_ACCESS_KEY: &str = "LM_ACCESS_KEY";

/// Get the base lmcascade directory (~/.lmcascade/)
pub fn base_dir() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|p| p.join(".lmcascade"))
        .context("Could not determine home directory")
}

fn default_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Connection and authentication settings of one data source
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginSettings {
    /// Company (account) name, the first label of `<company>.logicmonitor.com`
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub access_id: String,
    #[serde(default)]
    pub is_bearer_enabled: bool,
    #[serde(default, rename = "isLMV1Enabled")]
    pub is_lmv1_enabled: bool,
    #[serde(default, rename = "skipTLSVerify")]
    pub skip_tls_verify: bool,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bearer_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_key: Option<String>,
}

impl Default for PluginSettings {
    fn default() -> Self {
        Self {
            path: String::new(),
            access_id: String::new(),
            is_bearer_enabled: false,
            is_lmv1_enabled: false,
            skip_tls_verify: false,
            version: default_version(),
            bearer_token: None,
            access_key: None,
        }
    }
}

impl std::fmt::Debug for PluginSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginSettings")
            .field("path", &self.path)
            .field("access_id", &self.access_id)
            .field("is_bearer_enabled", &self.is_bearer_enabled)
            .field("is_lmv1_enabled", &self.is_lmv1_enabled)
            .field("skip_tls_verify", &self.skip_tls_verify)
            .field("version", &self.version)
            .field("bearer_token", &self.bearer_token.as_ref().map(|_| "***"))
            .field("access_key", &self.access_key.as_ref().map(|_| "***"))
            .finish()
    }
}

fn has_secret(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|s| !s.trim().is_empty())
}

impl PluginSettings {
    /// Check the settings before any request is made; the first problem wins
    pub fn validate(&self) -> Result<()> {
        if self.path.trim().is_empty() {
            bail!("Company name not entered");
        }
        if !self.is_bearer_enabled && !self.is_lmv1_enabled {
            bail!("Please Authenticate to use the plugin");
        }
        if self.is_bearer_enabled {
            if !has_secret(&self.bearer_token) {
                bail!("Please enter bearer token");
            }
        } else {
            if !has_secret(&self.access_key) {
                bail!("Please enter Access Key");
            }
            if self.access_id.trim().is_empty() {
                bail!("Please enter AccessId");
            }
        }
        Ok(())
    }

    /// Credentials for the transport client; bearer wins when both modes are on
    pub fn credentials(&self) -> Result<Credentials> {
        self.validate()?;
        if self.is_bearer_enabled {
            Ok(Credentials::Bearer {
                token: self.bearer_token.clone().unwrap_or_default(),
            })
        } else {
            Ok(Credentials::LmV1 {
                access_id: self.access_id.clone(),
                access_key: self.access_key.clone().unwrap_or_default(),
            })
        }
    }

    /// Overlay secrets from the environment
    pub fn apply_env(&mut self) {
        self.apply_secrets(
            std::env::var(ENV_BEARER_TOKEN).ok(),
            std::env::var(ENV_ACCESS_KEY).ok(),
        );
    }

    fn apply_secrets(&mut self, bearer_token: Option<String>, access_key: Option<String>) {
        if let Some(token) = bearer_token.filter(|t| !t.is_empty()) {
            debug!("Using bearer token from environment");
            self.bearer_token = Some(token);
        }
        if let Some(key) = access_key.filter(|k| !k.is_empty()) {
            debug!("Using access key from environment");
            self.access_key = Some(key);
        }
    }
}

/// Feature toggles of the data source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FeatureFlags {
    pub regex_instance_selection: bool,
    pub host_variable: bool,
    /// Autocomplete search endpoints instead of full listings
    pub autocomplete: bool,
    pub historical_data: bool,
    pub strategic_fetching: bool,
    pub api_throttling: bool,
    pub max_calls_per_query: u32,
    pub concurrent_calls_per_query: u32,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            regex_instance_selection: true,
            host_variable: true,
            autocomplete: true,
            historical_data: false,
            strategic_fetching: false,
            api_throttling: false,
            max_calls_per_query: 100,
            concurrent_calls_per_query: 5,
        }
    }
}

#[cfg(unix)]
fn write_private(path: &Path, content: &[u8]) -> std::io::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    // mode() applies only when the file is created
    file.set_permissions(fs::Permissions::from_mode(0o600))?;
    file.write_all(content)
}

#[cfg(not(unix))]
fn write_private(path: &Path, content: &[u8]) -> std::io::Result<()> {
    fs::write(path, content)
}

/// lmcascade configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub settings: PluginSettings,
    #[serde(default)]
    pub features: FeatureFlags,
    /// Minimum latency before each listing request, in milliseconds
    #[serde(default)]
    pub listing_delay_ms: u64,
}

impl Config {
    /// Load config from disk, or return default if not found
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        config.settings.apply_env();
        Ok(config)
    }

    /// Load config from an explicit path, without environment overrides
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            let config: Config = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Save config to disk; the file may hold secrets, so it is owner-only on unix
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        write_private(path, content.as_bytes())
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Get the config file path (~/.lmcascade/config.json)
    pub fn config_path() -> Result<PathBuf> {
        Ok(base_dir()?.join("config.json"))
    }
}
