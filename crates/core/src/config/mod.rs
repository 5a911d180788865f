//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (PODIUM_*)
//! 2. TOML config file (if PODIUM_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (PODIUM_*)
/// 2. TOML config file (if PODIUM_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Root directory of the featured-list mirror.
    ///
    /// Set via PODIUM_CACHE_DIR environment variable.
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,

    /// Base URL of the remote document store.
    ///
    /// Set via PODIUM_DATABASE_URL environment variable.
    /// Required only when the REST document store is built from config.
    #[serde(default)]
    pub database_url: Option<String>,

    /// Access token appended to document store requests.
    ///
    /// Set via PODIUM_AUTH_TOKEN environment variable.
    #[serde(default)]
    pub auth_token: Option<String>,

    /// User-Agent string for HTTP requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// HTTP request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Largest thumbnail download accepted, in bytes.
    #[serde(default = "default_max_thumbnail_bytes")]
    pub max_thumbnail_bytes: usize,

    /// Thumbnails cached per featured list (0 disables prefetch).
    #[serde(default = "default_thumbnails_per_list")]
    pub thumbnails_per_list: usize,

    /// Attempts made by the retrying loader before giving up.
    #[serde(default = "default_load_attempts")]
    pub load_attempts: u32,

    /// Delay between loader attempts in milliseconds.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Persist rebuilds on a background task instead of before returning.
    #[serde(default = "default_true")]
    pub background_persist: bool,
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("./podium-cache")
}

fn default_user_agent() -> String {
    "podium/0.1".into()
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_max_thumbnail_bytes() -> usize {
    2 * 1024 * 1024
}

fn default_thumbnails_per_list() -> usize {
    3
}

fn default_load_attempts() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    750
}

fn default_true() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            cache_dir: default_cache_dir(),
            database_url: None,
            auth_token: None,
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            max_thumbnail_bytes: default_max_thumbnail_bytes(),
            thumbnails_per_list: default_thumbnails_per_list(),
            load_attempts: default_load_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
            background_persist: true,
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Delay between loader attempts.
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `PODIUM_`
    /// 2. TOML file from `PODIUM_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("PODIUM_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("PODIUM_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// Check if the document store URL is available (for deferred validation).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if the database URL is not set.
    pub fn require_database_url(&self) -> Result<&str, ConfigError> {
        self.database_url.as_deref().ok_or_else(|| ConfigError::Missing {
            field: "database_url".into(),
            hint: "Set PODIUM_DATABASE_URL environment variable".into(),
        })
    }
}
