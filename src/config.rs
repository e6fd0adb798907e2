//! Runtime configuration for the client
//!
//! Everything has a compile-time default in `constants`. Only the API base URL
//! and the storage directory can be overridden from the environment.

use crate::constants::{
    API_URL_ENV, COINGECKO_API_URL, REQUEST_TIMEOUT_SECS, STORAGE_DIR_ENV,
};
use std::path::PathBuf;
use std::time::Duration;

/// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the CoinGecko API (no trailing slash)
    pub api_base_url: String,
    /// Timeout applied to every outbound request
    pub request_timeout: Duration,
    /// Directory for persistent storage; `None` runs without persistence
    pub storage_dir: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: COINGECKO_API_URL.to_string(),
            request_timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            storage_dir: None,
        }
    }
}

impl ClientConfig {
    /// Builds a configuration from the defaults plus environment overrides
    ///
    /// * `CRYPTOQUICK_API_URL` replaces the API base URL
    /// * `CRYPTOQUICK_STORAGE_DIR` enables file-backed storage in that directory
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = std::env::var(API_URL_ENV) {
            let url = url.trim().trim_end_matches('/');
            if !url.is_empty() {
                config.api_base_url = url.to_string();
            }
        }

        if let Ok(dir) = std::env::var(STORAGE_DIR_ENV) {
            if !dir.trim().is_empty() {
                config.storage_dir = Some(PathBuf::from(dir));
            }
        }

        config
    }

    /// Replaces the API base URL
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Enables file-backed storage rooted at `dir`
    pub fn with_storage_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.storage_dir = Some(dir.into());
        self
    }
}
