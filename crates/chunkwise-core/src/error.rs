//! Error types for chunkwise-core.

use std::io;
use std::path::PathBuf;

use chunkwise_fetch::TransportError;
use chunkwise_verify::Checksum;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path:   PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Fs(#[from] chunkwise_fs::Error),

    #[error("failed to retrieve {what}: {source}")]
    Transport {
        what:   String,
        #[source]
        source: TransportError,
    },

    #[error("checksum mismatch for chunk {chunk} (index {index}): expected {expected}, got {actual}")]
    Integrity {
        chunk:    String,
        index:    u64,
        expected: Checksum,
        actual:   Checksum,
    },

    #[error("size mismatch for chunk {chunk} (index {index}): expected {expected} bytes, got {actual}")]
    SizeMismatch {
        chunk:    String,
        index:    u64,
        expected: u64,
        actual:   u64,
    },

    #[error("invalid manifest: {0}")]
    ManifestFormat(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("background task failed: {0}")]
    Task(String),
}

/// Coarse failure taxonomy, for callers that branch on the kind of failure
/// rather than its details.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Io,
    Transport,
    Integrity,
    ManifestFormat,
    InvalidArgument,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Io { .. } | Error::Fs(_) | Error::Task(_) => ErrorKind::Io,
            Error::Transport { .. } => ErrorKind::Transport,
            Error::Integrity { .. } | Error::SizeMismatch { .. } => ErrorKind::Integrity,
            Error::ManifestFormat(_) => ErrorKind::ManifestFormat,
            Error::InvalidArgument(_) => ErrorKind::InvalidArgument,
        }
    }

    /// Name of the chunk that triggered the failure, when there is one.
    pub fn chunk(&self) -> Option<&str> {
        match self {
            Error::Integrity { chunk, .. } | Error::SizeMismatch { chunk, .. } => Some(chunk),
            _ => None,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> Self {
        let path = path.into();
        move |source| Error::Io { path, source }
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(e: tokio::task::JoinError) -> Self { Error::Task(e.to_string()) }
}

pub type Result<T> = std::result::Result<T, Error>;
