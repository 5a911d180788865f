//! JSON-over-HTTP document store.
//!
//! ### Protocol
//!
//! - **Addressing**: a store path `a/b/c` maps to `{base_url}/a/b/c.json`.
//! - **Verbs**: `GET` reads, `PUT` writes, `PATCH` merges, `DELETE` removes.
//! - **Authentication**: optional token sent as the `auth` query parameter.
//! - **Absence**: a `null` body or `404` means nothing is stored at the path.
//! - **Failures**: timeouts, connection errors and `5xx` are transient;
//!   `401`/`403` are auth errors and never retried by the caller.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{StatusCode, header};
use serde_json::{Map, Value};
use url::Url;

use super::{DocumentStore, StoreError, segments};
use podium_core::AppConfig;

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default user agent.
const DEFAULT_USER_AGENT: &str = "podium/0.1";

/// REST document store configuration.
#[derive(Debug, Clone)]
pub struct RestConfig {
    /// Base URL of the store, e.g. `https://example-db.firebaseio.com`.
    pub base_url: String,
    /// Access token, if the store requires one.
    pub auth_token: Option<String>,
    /// Request timeout (default: 10s).
    pub timeout: Duration,
    /// User-agent string (default: podium/0.1).
    pub user_agent: String,
}

impl Default for RestConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            auth_token: None,
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl RestConfig {
    /// Build from application configuration. Requires `database_url`.
    pub fn from_app_config(config: &AppConfig) -> Result<Self, podium_core::ConfigError> {
        Ok(Self {
            base_url: config.require_database_url()?.to_string(),
            auth_token: config.auth_token.clone(),
            timeout: config.timeout(),
            user_agent: config.user_agent.clone(),
        })
    }
}

/// Document store client over HTTP.
#[derive(Debug, Clone)]
pub struct RestDocumentStore {
    http: reqwest::Client,
    base: Url,
    auth_token: Option<String>,
}

impl RestDocumentStore {
    /// Create a new client with the given configuration.
    pub fn new(config: RestConfig) -> Result<Self, StoreError> {
        let mut base_url = config.base_url.trim().to_string();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        let base = Url::parse(&base_url).map_err(|e| StoreError::InvalidPath(format!("base url: {e}")))?;

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .use_rustls_tls()
            .gzip(true)
            .build()?;

        Ok(Self { http, base, auth_token: config.auth_token })
    }

    /// Resolve a store path to its request URL.
    fn url_for(&self, path: &str) -> Result<Url, StoreError> {
        let relative = format!("{}.json", segments(path)?.join("/"));
        let mut url = self
            .base
            .join(&relative)
            .map_err(|e| StoreError::InvalidPath(format!("{path}: {e}")))?;
        if let Some(token) = &self.auth_token {
            url.query_pairs_mut().append_pair("auth", token);
        }
        Ok(url)
    }

    async fn send(&self, request: reqwest::RequestBuilder, path: &str) -> Result<reqwest::Response, StoreError> {
        let start = Instant::now();
        let response = request.header(header::ACCEPT, "application/json").send().await?;
        let status = response.status();
        tracing::debug!("document store {} -> {} in {:?}", path, status, start.elapsed());

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(StoreError::AuthError { status: status.as_u16() });
        }
        Ok(response)
    }

    fn check_status(status: StatusCode) -> Result<(), StoreError> {
        if status.is_client_error() || status.is_server_error() {
            return Err(StoreError::HttpError { status: status.as_u16() });
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for RestDocumentStore {
    async fn read(&self, path: &str) -> Result<Option<Value>, StoreError> {
        let url = self.url_for(path)?;
        let response = self.send(self.http.get(url), path).await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Self::check_status(status)?;

        let bytes = response.bytes().await?;
        let value: Value = serde_json::from_slice(&bytes).map_err(|e| StoreError::Parse(e.to_string()))?;
        Ok(if value.is_null() { None } else { Some(value) })
    }

    async fn write(&self, path: &str, value: Value) -> Result<(), StoreError> {
        let url = self.url_for(path)?;
        let response = self.send(self.http.put(url).json(&value), path).await?;
        Self::check_status(response.status())
    }

    async fn update(&self, path: &str, fields: Map<String, Value>) -> Result<(), StoreError> {
        let url = self.url_for(path)?;
        let response = self.send(self.http.patch(url).json(&fields), path).await?;
        Self::check_status(response.status())
    }

    async fn remove(&self, path: &str) -> Result<(), StoreError> {
        let url = self.url_for(path)?;
        let response = self.send(self.http.delete(url), path).await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(());
        }
        Self::check_status(status)
    }
}
