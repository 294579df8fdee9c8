//! Runtime configuration read from the environment.

use std::path::PathBuf;
use std::time::Duration;
use crate::{Result, StorefrontError};

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000/api";
pub const DEFAULT_STORAGE_KEY: &str = "cart-storage-v1";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StorefrontConfig {
    pub api_base_url: String,
    pub request_timeout: Duration,
    pub storage_dir: PathBuf,
    pub storage_key: String,
    pub hydration_delay: Duration,
    pub checkout_processing_delay: Duration,
    pub checkout_success_display: Duration,
    pub port: u16,
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout: Duration::from_millis(10_000),
            storage_dir: PathBuf::from(".storefront"),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            hydration_delay: Duration::from_millis(500),
            checkout_processing_delay: Duration::from_millis(1_500),
            checkout_success_display: Duration::from_millis(3_000),
            port: 3000,
        }
    }
}

impl StorefrontConfig {
    /// Reads `STOREFRONT_*` variables (and `PORT`), falling back to defaults.
    /// Call `dotenvy::dotenv()` first if a `.env` file should apply.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        let millis = |key: &str, default: Duration| -> Result<Duration> {
            match lookup(key) {
                Some(raw) => raw.trim().parse::<u64>().map(Duration::from_millis)
                    .map_err(|e| StorefrontError::Config(format!("{key}={raw:?}: {e}"))),
                None => Ok(default),
            }
        };

        let port = match lookup("PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|e| StorefrontError::Config(format!("PORT={raw:?}: {e}")))?,
            None => defaults.port,
        };

        Ok(Self {
            api_base_url: lookup("STOREFRONT_API_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_base_url),
            request_timeout: millis("STOREFRONT_API_TIMEOUT_MS", defaults.request_timeout)?,
            storage_dir: lookup("STOREFRONT_STORAGE_DIR").map(PathBuf::from).unwrap_or(defaults.storage_dir),
            storage_key: lookup("STOREFRONT_STORAGE_KEY").unwrap_or(defaults.storage_key),
            hydration_delay: millis("STOREFRONT_HYDRATION_DELAY_MS", defaults.hydration_delay)?,
            checkout_processing_delay: millis("STOREFRONT_CHECKOUT_DELAY_MS", defaults.checkout_processing_delay)?,
            checkout_success_display: millis("STOREFRONT_CHECKOUT_SUCCESS_MS", defaults.checkout_success_display)?,
            port,
        })
    }
}
