//! Error types for stowage-core

use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for stowage-core
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for stowage-core
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration file not found
    #[error("Configuration file not found: {0}")]
    ConfigNotFound(PathBuf),

    /// Invalid configuration format
    #[error("Invalid configuration format: {0}")]
    InvalidConfig(String),

    /// Error body returned by the storage service
    #[error("Storage API error: {0}")]
    Api(StorageApiError),

    /// Object or bucket does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Network error
    #[error("Network error: {0}")]
    Network(String),

    /// HTTP client error (request could not be built or sent)
    #[error("HTTP client error: {0}")]
    HttpClient(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] toml::ser::Error),

    /// Deserialization error
    #[error("Deserialization error: {0}")]
    Deserialization(#[from] toml::de::Error),

    /// Response body did not match the expected JSON shape
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Timeout
    #[error("Operation timed out")]
    Timeout,

    /// Request aborted through its cancellation token
    #[error("Operation cancelled")]
    Cancelled,
}

impl Error {
    /// Numeric status carried by a service error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api(api) => api.status(),
            Error::NotFound(_) => Some(404),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Error::Timeout
        } else if err.is_decode() {
            Error::HttpClient(format!("failed to read response body: {}", err))
        } else if err.is_connect() {
            Error::Network(err.to_string())
        } else if err.is_request() || err.is_builder() {
            Error::HttpClient(err.to_string())
        } else {
            Error::Network(err.to_string())
        }
    }
}

/// Error body returned by the storage service.
///
/// The service encodes `statusCode` as a string (`"404"`); it is kept verbatim
/// for wire compatibility and parsed on demand through [`StorageApiError::status`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StorageApiError {
    #[serde(rename = "statusCode", default, deserialize_with = "string_or_number")]
    pub status_code: String,
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub message: String,
}

impl StorageApiError {
    pub fn status(&self) -> Option<u16> {
        self.status_code.trim().parse().ok()
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

impl fmt::Display for StorageApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl std::error::Error for StorageApiError {}

// Some service versions send `statusCode` as a bare number.
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Str(String),
        Num(i64),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Str(s)) => s,
        Some(Raw::Num(n)) => n.to_string(),
        None => String::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_api_error_from_string_status() {
        let err: StorageApiError = serde_json::from_str(
            r#"{"statusCode":"404","error":"not_found","message":"Object not found"}"#,
        )
        .unwrap();

        assert_eq!(err.status_code, "404");
        assert_eq!(err.status(), Some(404));
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "not_found: Object not found");
    }

    #[test]
    fn test_storage_api_error_from_numeric_status() {
        let err: StorageApiError =
            serde_json::from_str(r#"{"statusCode":403,"error":"Unauthorized","message":"denied"}"#)
                .unwrap();

        assert_eq!(err.status_code, "403");
        assert_eq!(err.status(), Some(403));
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_storage_api_error_missing_fields() {
        let err: StorageApiError = serde_json::from_str(r#"{"message":"boom"}"#).unwrap();

        assert_eq!(err.status(), None);
        assert_eq!(err.message, "boom");
    }

    #[test]
    fn test_error_status_accessor() {
        let api = Error::Api(StorageApiError {
            status_code: "403".to_string(),
            error: "Unauthorized".to_string(),
            message: "denied".to_string(),
        });

        assert_eq!(api.status(), Some(403));
        assert!(!api.is_not_found());
        assert_eq!(Error::NotFound("a.txt".to_string()).status(), Some(404));
        assert_eq!(Error::Timeout.status(), None);
    }
}
