use std::io;

use crate::Checksum;

#[derive(Debug, thiserror::Error)]
pub enum VerificationError {
    #[error("checksum mismatch: expected {expected}, got {actual}")]
    Mismatch {
        expected: Checksum,
        actual:   Checksum,
    },

    #[error("invalid sha256 hex digest: {0:?}")]
    InvalidHex(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, VerificationError>;
