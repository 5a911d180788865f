//! Thumbnail downloads for cached featured lists.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header;

use podium_core::{AppConfig, Error};

/// Source of thumbnail image bytes.
///
/// This allows swapping the download path (or stubbing it in tests) without
/// touching the rebuild pipeline.
#[async_trait]
pub trait ThumbnailSource: Send + Sync {
    /// Fetch the image at `url`.
    async fn fetch(&self, url: &str) -> Result<Bytes, Error>;
}

/// Configuration for the HTTP thumbnail source.
#[derive(Debug, Clone)]
pub struct ThumbnailConfig {
    /// User agent string (default: "podium/0.1")
    pub user_agent: String,

    /// Maximum image size in bytes (default: 2MB)
    pub max_bytes: usize,

    /// Request timeout (default: 10s)
    pub timeout: Duration,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self { user_agent: "podium/0.1".to_string(), max_bytes: 2 * 1024 * 1024, timeout: Duration::from_secs(10) }
    }
}

impl From<&AppConfig> for ThumbnailConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            max_bytes: config.max_thumbnail_bytes,
            timeout: config.timeout(),
        }
    }
}

/// Downloads thumbnails over HTTP with a size cap.
pub struct HttpThumbnailSource {
    http: reqwest::Client,
    config: ThumbnailConfig,
}

impl HttpThumbnailSource {
    /// Create a new thumbnail source with the given configuration.
    pub fn new(config: ThumbnailConfig) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .use_rustls_tls()
            .build()
            .map_err(|e| Error::Unreachable(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, config })
    }
}

#[async_trait]
impl ThumbnailSource for HttpThumbnailSource {
    async fn fetch(&self, url: &str) -> Result<Bytes, Error> {
        let start = Instant::now();
        let url = url::Url::parse(url).map_err(|e| Error::InvalidInput(format!("thumbnail url {url:?}: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::InvalidInput(format!("thumbnail url scheme {} not supported", url.scheme())));
        }

        let response = self
            .http
            .get(url.as_str())
            .header(header::ACCEPT, "image/*")
            .send()
            .await
            .map_err(|e| Error::Unreachable(format!("network error: {e}")))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(Error::NotFound(format!("thumbnail {url}")));
        }
        if !status.is_success() {
            return Err(Error::Unreachable(format!("thumbnail status {}", status.as_u16())));
        }

        if let Some(len) = response.content_length()
            && len as usize > self.config.max_bytes
        {
            return Err(Error::InvalidInput(format!("thumbnail {len} bytes exceeds {}", self.config.max_bytes)));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::Unreachable(format!("failed to read thumbnail: {e}")))?;

        if bytes.len() > self.config.max_bytes {
            return Err(Error::InvalidInput(format!(
                "thumbnail {} bytes exceeds {}",
                bytes.len(),
                self.config.max_bytes
            )));
        }

        tracing::debug!("fetched thumbnail {} in {:?} ({} bytes)", url, start.elapsed(), bytes.len());

        Ok(bytes)
    }
}
