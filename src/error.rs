//! Error handling for the mirroring engine.
//!
//! Every failure the engine can hit is one variant of [`Error`]. Callers use
//! [`Error::kind`] to group failures for reporting and [`Error::is_retryable`]
//! to decide whether another attempt makes sense. Per-file errors never abort
//! a run; they end up in the [`TransferResult`](crate::TransferResult) of the
//! affected file.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can happen while mirroring a directory index.
#[derive(Error, Debug)]
pub enum Error {
    /// The request could not be sent or no response arrived in time.
    #[error("network error while requesting {url}")]
    Network {
        url: String,
        #[source]
        source: reqwest_middleware::Error,
    },

    /// The response body stopped before it was fully received.
    ///
    /// Unlike [`Error::Network`] this happens after the server answered, so the
    /// request-level retry middleware never sees it.
    #[error("transfer of {url} was interrupted")]
    Interrupted {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server or the proxy rejected the credentials (401/407).
    #[error("authentication rejected for {url} (HTTP {status})")]
    Auth { url: String, status: u16 },

    /// The remote entry does not exist (404/410).
    #[error("{url} was not found")]
    NotFound { url: String },

    /// The server failed to answer the request (5xx).
    #[error("server error for {url} (HTTP {status})")]
    Server { url: String, status: u16 },

    /// Any other unexpected HTTP status.
    #[error("unexpected HTTP status {status} for {url}")]
    Status { url: String, status: u16 },

    /// The transferred file does not have the size the server announced.
    #[error("size mismatch for {path:?}: expected {expected} bytes, found {actual}")]
    Integrity {
        path: PathBuf,
        expected: u64,
        actual: u64,
    },

    /// A local file operation failed.
    #[error("filesystem error on {path:?}")]
    Filesystem {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The page could not be read as a directory listing.
    #[error("{url} is not a directory listing: {reason}")]
    Listing { url: String, reason: String },

    /// A URL could not be parsed or is not usable for mirroring.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// The mirror configuration is not usable.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The run was stopped before this operation completed.
    #[error("operation cancelled")]
    Cancelled,
}

/// Coarse classification of an [`Error`], used for retry decisions and reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Network,
    Auth,
    NotFound,
    Server,
    Http,
    Integrity,
    Filesystem,
    Listing,
    Config,
    Cancelled,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::Network => "network",
            ErrorKind::Auth => "auth",
            ErrorKind::NotFound => "not-found",
            ErrorKind::Server => "server",
            ErrorKind::Http => "http",
            ErrorKind::Integrity => "size-mismatch",
            ErrorKind::Filesystem => "filesystem",
            ErrorKind::Listing => "listing",
            ErrorKind::Config => "config",
            ErrorKind::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

impl Error {
    /// Classify the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Network { .. } | Error::Interrupted { .. } => ErrorKind::Network,
            Error::Auth { .. } => ErrorKind::Auth,
            Error::NotFound { .. } => ErrorKind::NotFound,
            Error::Server { .. } => ErrorKind::Server,
            Error::Status { .. } => ErrorKind::Http,
            Error::Integrity { .. } => ErrorKind::Integrity,
            Error::Filesystem { .. } => ErrorKind::Filesystem,
            Error::Listing { .. } => ErrorKind::Listing,
            Error::InvalidUrl(_) | Error::Config(_) => ErrorKind::Config,
            Error::Cancelled => ErrorKind::Cancelled,
        }
    }

    /// Network and server failures may succeed on a later attempt.
    ///
    /// Authentication, missing entries, integrity and filesystem problems need
    /// a human to fix something first.
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Network | ErrorKind::Server)
    }

    /// Whether the failure happened while streaming a response body.
    pub fn is_interruption(&self) -> bool {
        matches!(self, Error::Interrupted { .. })
    }

    pub(crate) fn filesystem(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Filesystem {
            path: path.into(),
            source,
        }
    }

    /// Map a non-success HTTP status to the matching variant.
    pub(crate) fn from_status(url: &str, status: reqwest::StatusCode) -> Self {
        let url = url.to_string();
        let code = status.as_u16();
        match code {
            401 | 407 => Error::Auth { url, status: code },
            404 | 410 => Error::NotFound { url },
            500..=599 => Error::Server { url, status: code },
            _ => Error::Status { url, status: code },
        }
    }
}

/// Result type alias for operations that can fail with an [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_status_classification() {
        let url = "http://h/a/file.bin";
        assert_eq!(
            Error::from_status(url, StatusCode::UNAUTHORIZED).kind(),
            ErrorKind::Auth
        );
        assert_eq!(
            Error::from_status(url, StatusCode::PROXY_AUTHENTICATION_REQUIRED).kind(),
            ErrorKind::Auth
        );
        assert_eq!(
            Error::from_status(url, StatusCode::NOT_FOUND).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            Error::from_status(url, StatusCode::BAD_GATEWAY).kind(),
            ErrorKind::Server
        );
        assert_eq!(
            Error::from_status(url, StatusCode::FORBIDDEN).kind(),
            ErrorKind::Http
        );
    }

    #[test]
    fn test_retry_policy_per_kind() {
        let url = "http://h/x";
        assert!(Error::from_status(url, StatusCode::SERVICE_UNAVAILABLE).is_retryable());
        assert!(!Error::from_status(url, StatusCode::UNAUTHORIZED).is_retryable());
        assert!(!Error::from_status(url, StatusCode::NOT_FOUND).is_retryable());
        assert!(!Error::Integrity {
            path: PathBuf::from("x"),
            expected: 2,
            actual: 1
        }
        .is_retryable());
        assert!(!Error::filesystem("x", io::Error::other("disk full")).is_retryable());
        assert!(!Error::Cancelled.is_retryable());
    }

    #[test]
    fn test_error_display() {
        let err = Error::Integrity {
            path: PathBuf::from("sub/c.txt"),
            expected: 50,
            actual: 20,
        };
        assert!(err.to_string().contains("expected 50 bytes, found 20"));
        assert_eq!(ErrorKind::Integrity.to_string(), "size-mismatch");
    }
}
