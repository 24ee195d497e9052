// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::path::{Path, PathBuf};
use std::str::FromStr;

use calsync_caldav::CalDavConfig;

use crate::error::ConfigError;
use crate::mutation::{DEFAULT_METADATA_FIELDS, MetadataFields};
use crate::reconciler::{DEFAULT_MAX_CONCURRENCY, ReconcileOptions};

/// The name of the application, used for config directories.
pub const APP_NAME: &str = "calsync";

/// Configuration of calsync.
///
/// ```toml
/// [server]
/// base_url = "https://dav.example.com"
/// calendar_home = "/dav/calendars/jane/"
/// auth = { type = "basic", username = "jane", password = "secret" }
///
/// [sync]
/// max_concurrency = 5
/// past_days = 30
/// future_days = 365
/// ```
#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    /// Server connection.
    pub server: CalDavConfig,

    /// Sync behaviour.
    #[serde(default)]
    pub sync: SyncConfig,
}

impl Config {
    /// Reads and parses a config file; `~/` and `$XDG_CONFIG_HOME/` prefixes
    /// are expanded.
    ///
    /// # Errors
    ///
    /// Fails if the path cannot be expanded, the file cannot be read or its
    /// content does not parse.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let path = expand_path(path)?;
        tracing::debug!(path = %path.display(), "loading config");
        let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        content.parse()
    }

    /// The default location, `$XDG_CONFIG_HOME/calsync/config.toml`.
    ///
    /// # Errors
    ///
    /// Fails if the user config directory is unknown.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        Ok(get_config_dir()?.join(APP_NAME).join("config.toml"))
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(toml::from_str(s)?)
    }
}

/// Sync and mutation settings.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Maximum number of resource fetches in flight per pass.
    pub max_concurrency: usize,

    /// Days before today covered by range queries.
    pub past_days: u32,

    /// Days after today covered by range queries.
    pub future_days: u32,

    /// Fields copied from a rewritten master onto its overrides.
    pub metadata_fields: Vec<String>,
}

impl SyncConfig {
    /// Options for a reconciliation pass.
    #[must_use]
    pub fn reconcile_options(&self) -> ReconcileOptions {
        ReconcileOptions {
            max_concurrency: self.max_concurrency,
            cancel: None,
        }
    }

    /// The metadata set for the mutation engine.
    #[must_use]
    pub fn metadata(&self) -> MetadataFields {
        MetadataFields::new(&self.metadata_fields)
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            past_days: 30,
            future_days: 365,
            metadata_fields: DEFAULT_METADATA_FIELDS
                .iter()
                .map(|f| (*f).to_string())
                .collect(),
        }
    }
}

fn expand_path(path: &Path) -> Result<PathBuf, ConfigError> {
    if path.is_absolute() {
        return Ok(path.to_owned());
    }

    let raw = path
        .to_str()
        .ok_or_else(|| ConfigError::Path(format!("invalid path: {}", path.display())))?;

    let home_prefixes: &[&str] = if cfg!(unix) {
        &["~/", "$HOME/", "${HOME}/"]
    } else {
        &[r"~\", "~/", r"%UserProfile%\", r"%UserProfile%/"]
    };
    for prefix in home_prefixes {
        if let Some(stripped) = raw.strip_prefix(prefix) {
            return Ok(get_home_dir()?.join(stripped));
        }
    }

    let config_prefixes: &[&str] = if cfg!(unix) {
        &["$XDG_CONFIG_HOME/", "${XDG_CONFIG_HOME}/"]
    } else {
        &[r"%LOCALAPPDATA%\", "%LOCALAPPDATA%/"]
    };
    for prefix in config_prefixes {
        if let Some(stripped) = raw.strip_prefix(prefix) {
            return Ok(get_config_dir()?.join(stripped));
        }
    }

    Ok(path.to_owned())
}

fn get_home_dir() -> Result<PathBuf, ConfigError> {
    dirs::home_dir().ok_or_else(|| ConfigError::Path("home directory not found".to_string()))
}

fn get_config_dir() -> Result<PathBuf, ConfigError> {
    #[cfg(unix)]
    let config_dir = xdg::BaseDirectories::new().get_config_home();
    #[cfg(not(unix))]
    let config_dir = dirs::config_dir();
    config_dir.ok_or_else(|| ConfigError::Path("config directory not found".to_string()))
}
