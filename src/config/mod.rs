//! Client configuration (layered: code > env > defaults).

use std::path::PathBuf;
use std::time::Duration;

use bon::Builder;

use crate::auth::store::{FileTokenStore, TokenStoreConfig};
use crate::error::{ApiError, Result};

pub const DEFAULT_BASE_URL: &str = "http://localhost:3333/";
pub const DEFAULT_REFRESH_PATH: &str = "/sessions/refresh-token";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings for the API client and its session storage.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use ignite::config::ClientConfig;
///
/// let config = ClientConfig::builder()
///     .base_url("http://192.168.0.109:3333/")
///     .timeout(Duration::from_secs(10))
///     .build();
/// assert_eq!(config.refresh_path, "/sessions/refresh-token");
/// ```
#[derive(Debug, Clone, Builder)]
pub struct ClientConfig {
    /// Base endpoint every request path is resolved against.
    #[builder(into, default = DEFAULT_BASE_URL.to_string())]
    pub base_url: String,
    /// Per-request timeout enforced by the transport.
    #[builder(default = DEFAULT_TIMEOUT)]
    pub timeout: Duration,
    /// Path of the token refresh endpoint.
    #[builder(into, default = DEFAULT_REFRESH_PATH.to_string())]
    pub refresh_path: String,
    /// Directory holding the persisted session.
    #[builder(default = TokenStoreConfig::default_dir())]
    pub token_dir: PathBuf,
    #[builder(into, default = "default".to_string())]
    pub profile: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl ClientConfig {
    /// Load from environment variables, after reading `.env` if present.
    ///
    /// | variable | field |
    /// |---|---|
    /// | `IGNITE_API_URL` | `base_url` |
    /// | `IGNITE_API_TIMEOUT_SECS` | `timeout` |
    /// | `IGNITE_REFRESH_PATH` | `refresh_path` |
    /// | `IGNITE_TOKEN_DIR` | `token_dir` |
    /// | `IGNITE_PROFILE` | `profile` |
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(url) = lookup("IGNITE_API_URL") {
            if url.trim().is_empty() {
                return Err(ApiError::Configuration(
                    "IGNITE_API_URL must not be empty".to_string(),
                ));
            }
            config.base_url = url;
        }
        if let Some(raw) = lookup("IGNITE_API_TIMEOUT_SECS") {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                ApiError::Configuration(format!(
                    "IGNITE_API_TIMEOUT_SECS must be a whole number of seconds, got {raw:?}"
                ))
            })?;
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(path) = lookup("IGNITE_REFRESH_PATH") {
            config.refresh_path = path;
        }
        if let Some(dir) = lookup("IGNITE_TOKEN_DIR") {
            config.token_dir = PathBuf::from(dir);
        }
        if let Some(profile) = lookup("IGNITE_PROFILE") {
            config.profile = profile;
        }
        Ok(config)
    }

    /// File-backed token store for the configured directory and profile.
    pub fn token_store(&self) -> FileTokenStore {
        FileTokenStore::new(
            TokenStoreConfig::new(self.token_dir.clone()).with_profile(self.profile.clone()),
        )
    }
}
