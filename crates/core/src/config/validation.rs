//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::cache::MAX_THUMBNAILS_PER_LIST;
use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `max_thumbnail_bytes` is 0 or exceeds 20MB
    /// - `thumbnails_per_list` exceeds 3
    /// - `load_attempts` is 0 or exceeds 10
    /// - `retry_delay_ms` exceeds 1 minute
    /// - `user_agent` is empty
    /// - `database_url` is set but is not an http(s) URL
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_ms < 100 {
            return Err(ConfigError::Invalid { field: "timeout_ms".into(), reason: "must be at least 100ms".into() });
        }
        if self.timeout_ms > 300_000 {
            return Err(ConfigError::Invalid {
                field: "timeout_ms".into(),
                reason: "must not exceed 5 minutes (300000ms)".into(),
            });
        }

        if self.max_thumbnail_bytes == 0 {
            return Err(ConfigError::Invalid {
                field: "max_thumbnail_bytes".into(),
                reason: "must be greater than 0".into(),
            });
        }
        if self.max_thumbnail_bytes > 20 * 1024 * 1024 {
            return Err(ConfigError::Invalid {
                field: "max_thumbnail_bytes".into(),
                reason: "must not exceed 20MB".into(),
            });
        }

        if self.thumbnails_per_list > MAX_THUMBNAILS_PER_LIST {
            return Err(ConfigError::Invalid {
                field: "thumbnails_per_list".into(),
                reason: format!("must not exceed {MAX_THUMBNAILS_PER_LIST}"),
            });
        }

        if self.load_attempts == 0 || self.load_attempts > 10 {
            return Err(ConfigError::Invalid { field: "load_attempts".into(), reason: "must be between 1 and 10".into() });
        }

        if self.retry_delay_ms > 60_000 {
            return Err(ConfigError::Invalid {
                field: "retry_delay_ms".into(),
                reason: "must not exceed 1 minute (60000ms)".into(),
            });
        }

        if self.user_agent.is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }

        if let Some(raw) = &self.database_url {
            let parsed = url::Url::parse(raw)
                .map_err(|e| ConfigError::Invalid { field: "database_url".into(), reason: e.to_string() })?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(ConfigError::Invalid {
                    field: "database_url".into(),
                    reason: "must use http or https".into(),
                });
            }
        }

        if self.auth_token.is_some() && self.database_url.is_none() {
            tracing::warn!("auth_token is set but database_url is not; the token will be unused");
        }

        Ok(())
    }
}
