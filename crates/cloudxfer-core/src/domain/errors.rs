//! Domain error types
//!
//! [`DomainError`] covers validation failures of domain values.
//! [`RemoteError`] is the closed set of failures a remote storage adapter can
//! report; the transfer engine matches on it to decide whether a failure is
//! worth retrying and how to describe it in a `TransferOutcome`.

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Invalid remote path format
    #[error("Invalid remote path: {0}")]
    InvalidRemotePath(String),

    /// Invalid or empty authentication token
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// Unknown enum value in configuration or CLI input
    #[error("Invalid value: {0}")]
    InvalidValue(String),
}

/// Errors reported by a remote storage adapter
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// A transient network or server failure that survived every retry
    #[error("Network error: {0}")]
    Transient(String),

    /// The credential was rejected or is missing
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The requested remote object does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// The API answered with a non-zero result code
    #[error("API error {code}: {message}")]
    Api {
        /// Service-specific result code
        code: i64,
        /// Message returned by the service
        message: String,
    },

    /// A non-retryable HTTP status (4xx other than 429)
    #[error("HTTP {status}: {message}")]
    Http {
        /// HTTP status code
        status: u16,
        /// Canonical reason or response excerpt
        message: String,
    },

    /// The response body could not be understood
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Reading or writing the local side of a stream failed
    #[error("Local I/O error: {0}")]
    LocalIo(String),
}

impl RemoteError {
    /// Returns true if a retry may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, RemoteError::Transient(_))
    }

    /// Returns true if the credential itself is the problem
    pub fn is_auth(&self) -> bool {
        matches!(self, RemoteError::Unauthorized(_))
    }
}

impl From<std::io::Error> for RemoteError {
    fn from(err: std::io::Error) -> Self {
        RemoteError::LocalIo(err.to_string())
    }
}
