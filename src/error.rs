//! Error types for the WowSQL client SDK.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Builder misuse, e.g. two mutation kinds set on one builder or an
    /// empty table name.
    #[error("Invalid query state: {0}")]
    InvalidQueryState(String),

    /// Malformed predicate, e.g. an `in` filter with an empty value list.
    #[error("Invalid predicate: {0}")]
    InvalidPredicate(String),

    /// Update or delete with no predicate and no explicit full-table override.
    #[error("Unsafe mutation: {0}")]
    UnsafeMutation(String),

    /// Transport-level failure: connection, timeout, cancellation.
    #[error("Network error: {0}")]
    Network(String),

    /// Non-2xx HTTP response from the backend.
    #[error("Backend error ({status}): {message}")]
    Backend { status: u16, message: String },

    /// Upload rejected by the quota guard before any bytes were transmitted.
    #[error("{message}")]
    StorageLimitExceeded {
        message: String,
        used_gb: f64,
        quota_gb: f64,
        expansion_gb: f64,
        status_code: u16,
    },

    /// Local file missing, or backend resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Synchronous quota check requested before any snapshot was fetched.
    #[error("Quota unavailable: no snapshot fetched yet, call get_quota first")]
    QuotaUnavailable,

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Self::Network(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
