// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use crate::error::CalDavError;

/// `CalDAV` authentication method.
#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(tag = "type")]
pub enum AuthMethod {
    /// No authentication.
    #[serde(rename = "none")]
    #[default]
    None,
    /// Basic authentication (username/password).
    #[serde(rename = "basic")]
    Basic {
        /// Username for authentication.
        username: String,
        /// Password for authentication.
        password: String,
    },
    /// Bearer token authentication (OAuth).
    #[serde(rename = "bearer")]
    Bearer {
        /// Bearer token.
        token: String,
    },
}

/// `CalDAV` server configuration.
///
/// ```toml
/// base_url = "https://dav.example.com"
/// calendar_home = "/dav/calendars/jane/"
/// auth = { type = "basic", username = "jane", password = "secret" }
/// ```
#[derive(Debug, Clone, serde::Deserialize)]
pub struct CalDavConfig {
    /// Base URL of the `CalDAV` server, without a trailing path.
    pub base_url: String,
    /// Calendar home path (e.g., /dav/calendars/user/).
    pub calendar_home: String,
    /// Authentication method.
    #[serde(default)]
    pub auth: AuthMethod,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// User agent string.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Accept self-signed certificates. Only meant for local test servers.
    #[serde(default)]
    pub accept_invalid_certs: bool,
}

impl CalDavConfig {
    /// Checks that the configuration can be used to build a client.
    ///
    /// # Errors
    ///
    /// Returns [`CalDavError::Config`] when the base URL does not parse or the
    /// calendar home is not an absolute path.
    pub fn validate(&self) -> Result<(), CalDavError> {
        reqwest::Url::parse(&self.base_url)
            .map_err(|e| CalDavError::Config(format!("invalid base_url '{}': {e}", self.base_url)))?;
        if !self.calendar_home.starts_with('/') {
            return Err(CalDavError::Config(format!(
                "calendar_home must be an absolute path, got '{}'",
                self.calendar_home
            )));
        }
        Ok(())
    }
}

const fn default_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    concat!("calsync-caldav/", env!("CARGO_PKG_VERSION")).to_string()
}

impl Default for CalDavConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            calendar_home: String::new(),
            auth: AuthMethod::default(),
            timeout_secs: default_timeout(),
            user_agent: default_user_agent(),
            accept_invalid_certs: false,
        }
    }
}
