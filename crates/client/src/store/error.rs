//! Document store error types.

use std::sync::Arc;

use podium_core::Error;

/// Errors from a document store backend.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    /// Path is empty or contains characters the store does not accept.
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// Authentication failed (missing or rejected token).
    #[error("authentication failed: HTTP {status}")]
    AuthError { status: u16 },

    /// Non-success HTTP status other than auth failures.
    #[error("HTTP error: {status}")]
    HttpError { status: u16 },

    /// Request timeout.
    #[error("request timeout")]
    Timeout,

    /// Network error.
    #[error("network error: {0}")]
    Network(Arc<reqwest::Error>),

    /// Store reported itself unavailable (used by the in-memory store's fault injection).
    #[error("store offline")]
    Offline,

    /// Response body was not valid JSON.
    #[error("parse error: {0}")]
    Parse(String),
}

impl StoreError {
    /// Whether retrying the same request could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            StoreError::Timeout | StoreError::Network(_) | StoreError::Offline => true,
            StoreError::HttpError { status } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() { StoreError::Timeout } else { StoreError::Network(Arc::new(err)) }
    }
}

impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::InvalidPath(msg) => Error::InvalidInput(msg),
            StoreError::AuthError { .. } => Error::RemoteAuth(err.to_string()),
            StoreError::Parse(msg) => Error::Decode(msg),
            StoreError::HttpError { status: 404 } => Error::NotFound(err.to_string()),
            _ => Error::Unreachable(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StoreError::AuthError { status: 401 };
        assert!(err.to_string().contains("authentication"));

        let err = StoreError::HttpError { status: 503 };
        assert!(err.to_string().contains("503"));
    }

    #[test]
    fn test_transient_classification() {
        assert!(StoreError::Timeout.is_transient());
        assert!(StoreError::Offline.is_transient());
        assert!(StoreError::HttpError { status: 503 }.is_transient());
        assert!(StoreError::HttpError { status: 429 }.is_transient());
        assert!(!StoreError::HttpError { status: 400 }.is_transient());
        assert!(!StoreError::AuthError { status: 403 }.is_transient());
    }

    #[test]
    fn test_into_core_error() {
        assert!(matches!(Error::from(StoreError::Offline), Error::Unreachable(_)));
        assert!(matches!(Error::from(StoreError::Timeout), Error::Unreachable(_)));
        assert!(matches!(Error::from(StoreError::AuthError { status: 401 }), Error::RemoteAuth(_)));
        assert!(matches!(Error::from(StoreError::Parse("x".into())), Error::Decode(_)));
        assert!(matches!(Error::from(StoreError::InvalidPath("".into())), Error::InvalidInput(_)));
    }
}
