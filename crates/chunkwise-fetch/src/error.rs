//! Error types for chunkwise-fetch.

use thiserror::Error;

/// A remote retrieval failure.
///
/// Non-success HTTP statuses are kept apart from connection-level failures so
/// callers can report "the object is not there" differently from "the network
/// is down".
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("request to {url} failed: {message}")]
    Connection { url: String, message: String },

    #[error("response body from {url} interrupted: {message}")]
    Body { url: String, message: String },

    #[error("response from {url} is not valid UTF-8")]
    InvalidText { url: String },
}

impl TransportError {
    /// The HTTP status, when the server answered with a non-success code.
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn url(&self) -> &str {
        match self {
            TransportError::InvalidUrl(url)
            | TransportError::Status { url, .. }
            | TransportError::Connection { url, .. }
            | TransportError::Body { url, .. }
            | TransportError::InvalidText { url } => url,
        }
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;
