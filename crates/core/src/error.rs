//! Unified error types for favicon-prefixer.
//!
//! Only [`Error::Unauthorized`] is meant to reach an end user as-is. Every
//! other variant raised while acquiring a favicon is logged and collapsed
//! into "no favicon" by the service layer.

use rmcp::model::{ErrorCode, ErrorData as McpError};
use tokio_rusqlite::rusqlite;

/// Unified error types for favicon-prefixer.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., unknown output format).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// URL could not be parsed or has no host.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// Icon provider request failed (transport error or non-2xx).
    #[error("FETCH_FAILED: {0}")]
    FetchFailed(String),

    /// Favicon bytes could not be written to disk.
    #[error("PERSIST_FAILED: {0}")]
    PersistFailed(String),

    /// Fragment could not be parsed as HTML.
    #[error("PARSE_FAILED: {0}")]
    ParseFailed(String),

    /// Caller lacks administrative authority.
    #[error("UNAUTHORIZED: {0}")]
    Unauthorized(String),

    /// Filesystem operation on the favicon directory failed.
    #[error("IO_ERROR: {0}")]
    Io(#[from] std::io::Error),

    /// Database operation failed.
    #[error("CACHE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("CACHE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// Stored option value could not be (de)serialized.
    #[error("CACHE_ERROR: invalid option value: {0}")]
    InvalidOption(String),
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::InvalidOption(err.to_string())
    }
}

impl From<Error> for McpError {
    fn from(err: Error) -> Self {
        let (code, message) = match &err {
            Error::InvalidInput(msg) => (-32602, msg.clone()),
            Error::InvalidUrl(msg) => (-32003, msg.clone()),
            Error::FetchFailed(msg) => (-32008, msg.clone()),
            Error::PersistFailed(msg) => (-32009, msg.clone()),
            Error::ParseFailed(msg) => (-32000, msg.clone()),
            Error::Unauthorized(msg) => (-32010, msg.clone()),
            Error::Io(e) => (-32002, e.to_string()),
            Error::Database(e) => (-32002, e.to_string()),
            Error::MigrationFailed(msg) => (-32002, msg.clone()),
            Error::InvalidOption(msg) => (-32002, msg.clone()),
        };

        McpError { code: ErrorCode(code), message: message.into(), data: None }
    }
}
