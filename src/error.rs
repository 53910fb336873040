//! Error handling for nxbrew-dl.
//!
//! Every fallible operation in the crate returns [`Error`]. The variants map to
//! how a failure is handled:
//!
//! - [`Error::Config`] is fatal at startup and never recovered silently.
//! - [`Error::Network`] carries a [`NetworkErrorKind`]; transient failures are
//!   retried with bounded backoff, permanent ones are surfaced per item.
//! - [`Error::Parse`] is logged and the offending item dropped.
//! - [`Error::Cache`] is reported as a warning; orchestration carries on.
//! - [`Error::Client`] fails a single title after its retries run out.

use std::fmt;
use std::io;
use thiserror::Error;

/// Whether retrying a network operation may succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkErrorKind {
    /// Timeouts, connection resets, server-side errors.
    Transient,
    /// Not found, malformed URL, other client-side errors.
    Permanent,
}

impl fmt::Display for NetworkErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkErrorKind::Transient => f.write_str("transient"),
            NetworkErrorKind::Permanent => f.write_str("permanent"),
        }
    }
}

/// Errors that can happen when building a catalog or orchestrating downloads.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid pattern rules, settings or preferences.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A page fetch or client call failed.
    #[error("Network error ({kind}): {message}")]
    Network {
        kind: NetworkErrorKind,
        message: String,
    },

    /// A page or link could not be classified.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The download cache could not be read or written.
    #[error("Cache error: {0}")]
    Cache(String),

    /// The download client rejected or failed a job.
    #[error("Download client error: {0}")]
    Client(String),

    /// I/O Error.
    #[error("I/O error")]
    IOError {
        #[from]
        source: io::Error,
    },

    /// Error from serde_json.
    #[error("JSON error")]
    Json {
        #[from]
        source: serde_json::Error,
    },
}

impl Error {
    /// Create a transient [`Error::Network`].
    pub fn transient(message: impl fmt::Display) -> Self {
        Error::Network {
            kind: NetworkErrorKind::Transient,
            message: message.to_string(),
        }
    }

    /// Create a permanent [`Error::Network`].
    pub fn permanent(message: impl fmt::Display) -> Self {
        Error::Network {
            kind: NetworkErrorKind::Permanent,
            message: message.to_string(),
        }
    }

    /// Returns `true` if retrying the failed operation may succeed.
    ///
    /// Client errors count as transient: a failed job may well succeed on
    /// resubmission.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Network { kind, .. } => *kind == NetworkErrorKind::Transient,
            Error::Client(_) => true,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_builder() {
            Error::permanent(e)
        } else if e.is_timeout() || e.is_connect() || e.is_request() || e.is_body() {
            Error::transient(e)
        } else if let Some(status) = e.status() {
            if status.is_server_error() {
                Error::transient(e)
            } else {
                Error::permanent(e)
            }
        } else {
            Error::transient(e)
        }
    }
}

impl From<reqwest_middleware::Error> for Error {
    fn from(e: reqwest_middleware::Error) -> Self {
        match e {
            reqwest_middleware::Error::Reqwest(e) => e.into(),
            reqwest_middleware::Error::Middleware(e) => Error::transient(e),
        }
    }
}

/// Result type alias for operations that can fail with an nxbrew-dl error.
pub type Result<T> = std::result::Result<T, Error>;
