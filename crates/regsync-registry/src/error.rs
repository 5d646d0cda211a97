//! Error types for registry listing.

use std::path::PathBuf;
use thiserror::Error;

/// Error produced by a registry backend.
pub type BackendError = Box<dyn std::error::Error + Send + Sync>;

/// Result type alias for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Errors that can occur while listing a registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The ECR service handle could not be created.
    #[error("error getting ECR service for region '{region}': {source}")]
    ServiceUnavailable {
        /// Region the service was requested for.
        region: String,
        /// Underlying backend error.
        #[source]
        source: BackendError,
    },

    /// Listing repositories failed.
    #[error("error listing ECR repositories of registry '{registry}': {source}")]
    ListFailed {
        /// Registry host.
        registry: String,
        /// Underlying backend error.
        #[source]
        source: BackendError,
    },

    /// The reachability probe failed.
    #[error("registry '{registry}' is not reachable: {source}")]
    PingFailed {
        /// Registry host.
        registry: String,
        /// Underlying backend error.
        #[source]
        source: BackendError,
    },

    /// No source is available for the registry.
    #[error("unsupported registry '{registry}': {reason}")]
    UnsupportedRegistry {
        /// Registry host.
        registry: String,
        /// Why no source could be built.
        reason: String,
    },

    /// Failed to connect to registry.
    #[error("Failed to connect to registry at {url}: {source}")]
    ConnectionFailed {
        /// Registry URL.
        url: String,
        /// Underlying error.
        #[source]
        source: reqwest::Error,
    },

    /// Credentials could not be turned into request headers.
    #[error("Authentication failed: {message}")]
    AuthenticationFailed {
        /// Error message.
        message: String,
    },

    /// HTTP error from registry.
    #[error("HTTP error from registry: {status} - {message}")]
    HttpError {
        /// HTTP status code.
        status: u16,
        /// Error message.
        message: String,
    },

    /// Invalid URL.
    #[error("Invalid URL: {url}")]
    InvalidUrl {
        /// URL string.
        url: String,
    },

    /// TLS material could not be loaded.
    #[error("Invalid TLS configuration: {message}")]
    InvalidTls {
        /// Error message.
        message: String,
    },

    /// File I/O error.
    #[error("File I/O error at {path}: {source}")]
    IoError {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

impl From<reqwest::Error> for RegistryError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() {
            Self::ConnectionFailed {
                url: err
                    .url()
                    .map_or_else(|| "unknown".to_string(), ToString::to_string),
                source: err,
            }
        } else if err.is_decode() {
            Self::HttpError {
                status: 0,
                message: format!("malformed response: {err}"),
            }
        } else {
            Self::HttpError {
                status: err.status().map_or(0, |s| s.as_u16()),
                message: err.to_string(),
            }
        }
    }
}
