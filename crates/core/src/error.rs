//! Unified error types for podium.
//!
//! Every variant carries a stable code prefix so callers and logs can match
//! on the failure class without parsing the free-form message.

use crate::model::ParseError;

/// Unified error type for the featured-list cache.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., a slot outside 1..=10).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Remote store unreachable, timed out, or answered with a server error.
    #[error("FETCH_UNREACHABLE: {0}")]
    Unreachable(String),

    /// Remote store rejected our credentials.
    #[error("REMOTE_AUTH: {0}")]
    RemoteAuth(String),

    /// A referenced document or cache file does not exist.
    #[error("NOT_FOUND: {0}")]
    NotFound(String),

    /// Local filesystem operation failed.
    #[error("STORAGE_ERROR: {path}: {source}")]
    Storage {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Malformed cached JSON or malformed remote record.
    #[error("DECODE_ERROR: {0}")]
    Decode(String),

    /// Bounded retry loop gave up.
    #[error("RETRIES_EXHAUSTED: {attempts} attempts, last error: {last}")]
    RetriesExhausted { attempts: u32, last: String },
}

impl Error {
    /// Wrap an I/O error with the path it happened on.
    pub fn storage(path: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
        Error::Storage { path: path.as_ref().display().to_string(), source }
    }

    /// Whether a later attempt could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Unreachable(_) | Error::Storage { .. })
    }
}

impl From<ParseError> for Error {
    fn from(err: ParseError) -> Self {
        Error::Decode(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Decode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Unreachable("connection refused".to_string());
        assert!(err.to_string().contains("FETCH_UNREACHABLE"));
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn test_storage_error_includes_path() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = Error::storage("/tmp/cache/index.json", io);
        let msg = err.to_string();
        assert!(msg.starts_with("STORAGE_ERROR"));
        assert!(msg.contains("index.json"));
    }

    #[test]
    fn test_transient_classification() {
        assert!(Error::Unreachable("timeout".into()).is_transient());
        assert!(!Error::RemoteAuth("401".into()).is_transient());
        assert!(!Error::Decode("bad".into()).is_transient());
        assert!(!Error::InvalidInput("slot".into()).is_transient());
    }

    #[test]
    fn test_parse_error_converts_to_decode() {
        let err: Error = ParseError::NotAnObject.into();
        assert!(matches!(err, Error::Decode(_)));
    }
}
