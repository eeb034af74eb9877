//! Client configuration loaded via OrthoConfig.
//!
//! Values come from `ERP_*` environment variables (or an OrthoConfig file);
//! every field is optional and falls back to a default suited to a local
//! backend.

use std::ffi::OsString;
use std::time::Duration;

use camino::Utf8PathBuf;
use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::domain::DEFAULT_SIGN_IN_ROUTE;

const DEFAULT_API_BASE_URL: &str = "http://localhost:5000/api";
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_STORAGE_PATH: &str = ".erp-session.json";

/// Errors raised while loading or interpreting [`ClientSettings`].
#[derive(Debug, Error)]
pub enum SettingsError {
    /// OrthoConfig could not assemble the settings.
    #[error("failed to load client settings: {0}")]
    Load(String),
    /// The configured base URL is not an absolute http(s) URL.
    #[error("invalid api base URL {url:?}: {reason}")]
    InvalidBaseUrl {
        /// Configured value.
        url: String,
        /// Why it was rejected.
        reason: String,
    },
    /// The timeout is zero.
    #[error("request timeout must be at least one second")]
    ZeroTimeout,
}

/// Settings for the School ERP client.
#[derive(Debug, Clone, Default, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "ERP")]
pub struct ClientSettings {
    /// Base URL every request path is joined onto.
    pub api_base_url: Option<String>,
    /// Request timeout in seconds.
    pub timeout_secs: Option<u64>,
    /// Route the session-expired handler is sent to.
    pub sign_in_route: Option<String>,
    /// Location of the session file.
    pub storage_path: Option<Utf8PathBuf>,
}

impl ClientSettings {
    /// Load settings from the environment and configuration files only.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Load`] when a source cannot be parsed.
    pub fn from_environment() -> Result<Self, SettingsError> {
        Self::load_from_iter([OsString::from(env!("CARGO_PKG_NAME"))])
            .map_err(|error| SettingsError::Load(error.to_string()))
    }

    /// Validated base URL.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::InvalidBaseUrl`] for unparsable or non-HTTP
    /// URLs.
    pub fn api_base_url(&self) -> Result<Url, SettingsError> {
        let raw = self.api_base_url.as_deref().unwrap_or(DEFAULT_API_BASE_URL);
        let invalid = |reason: String| SettingsError::InvalidBaseUrl {
            url: raw.to_owned(),
            reason,
        };
        let url = Url::parse(raw).map_err(|error| invalid(error.to_string()))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(invalid(format!("unsupported scheme {other}"))),
        }
    }

    /// Request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::ZeroTimeout`] when configured as zero.
    pub fn timeout(&self) -> Result<Duration, SettingsError> {
        match self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS) {
            0 => Err(SettingsError::ZeroTimeout),
            secs => Ok(Duration::from_secs(secs)),
        }
    }

    /// Sign-in route, falling back to the default.
    pub fn sign_in_route(&self) -> &str {
        self.sign_in_route
            .as_deref()
            .filter(|route| !route.trim().is_empty())
            .unwrap_or(DEFAULT_SIGN_IN_ROUTE)
    }

    /// Session file path, falling back to the default.
    pub fn storage_path(&self) -> Utf8PathBuf {
        self.storage_path
            .clone()
            .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_STORAGE_PATH))
    }
}
