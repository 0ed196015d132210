//! Client configuration (environment driven).

use std::path::PathBuf;

use thiserror::Error;

pub const API_URL_VAR: &str = "FLEETADMIN_API_URL";
pub const CREDENTIAL_PATH_VAR: &str = "FLEETADMIN_CREDENTIAL_PATH";
pub const DEFAULT_API_URL: &str = "http://localhost:8080";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the fleet REST backend (no trailing slash).
    pub api_url: String,
    /// File holding the persisted credential.
    pub credential_path: PathBuf,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be an http(s) URL, got '{1}'")]
    InvalidApiUrl(&'static str, String),
    #[error("no user data directory; set {0}")]
    NoDataDir(&'static str),
}

impl ClientConfig {
    pub fn new(api_url: impl Into<String>, credential_path: impl Into<PathBuf>) -> Self {
        Self {
            api_url: normalize_url(&api_url.into()),
            credential_path: credential_path.into(),
        }
    }

    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = lookup(API_URL_VAR)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let api_url = normalize_url(&api_url);
        if !(api_url.starts_with("http://") || api_url.starts_with("https://")) {
            return Err(ConfigError::InvalidApiUrl(API_URL_VAR, api_url));
        }

        let credential_path = match lookup(CREDENTIAL_PATH_VAR).filter(|v| !v.trim().is_empty()) {
            Some(path) => PathBuf::from(path),
            None => default_credential_path().ok_or(ConfigError::NoDataDir(CREDENTIAL_PATH_VAR))?,
        };

        Ok(Self {
            api_url,
            credential_path,
        })
    }
}

fn normalize_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

fn default_credential_path() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join("fleetadmin").join("credentials.json"))
}
