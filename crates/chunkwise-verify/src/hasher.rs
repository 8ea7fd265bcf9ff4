use std::fmt;
use std::str::FromStr;

use sha2::Digest as _;

use crate::VerificationError;

/// Length in bytes of a SHA-256 digest.
pub const CHECKSUM_LEN: usize = 32;

pub trait Hasher: Send {
    fn update(&mut self, data: &[u8]);
    fn finalize(self) -> Checksum;
}

#[derive(Clone, Default)]
pub struct Sha256Hasher(sha2::Sha256);

impl Hasher for Sha256Hasher {
    fn update(&mut self, data: &[u8]) { self.0.update(data); }

    fn finalize(self) -> Checksum { Checksum(self.0.finalize().into()) }
}

impl Sha256Hasher {
    pub fn new() -> Self { Self(sha2::Sha256::new()) }

    pub fn digest(data: &[u8]) -> Checksum { Checksum(sha2::Sha256::digest(data).into()) }
}

/// A SHA-256 digest.
///
/// Displays and serializes as 64 lowercase hex characters. Parsing accepts
/// either case.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Checksum([u8; CHECKSUM_LEN]);

impl Checksum {
    pub const fn from_bytes(bytes: [u8; CHECKSUM_LEN]) -> Self { Self(bytes) }

    pub fn to_hex(&self) -> String { hex::encode(self.0) }
}

impl FromStr for Checksum {
    type Err = VerificationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != CHECKSUM_LEN * 2 {
            return Err(VerificationError::InvalidHex(s.to_string()));
        }
        let mut bytes = [0u8; CHECKSUM_LEN];
        hex::decode_to_slice(s, &mut bytes)
            .map_err(|_| VerificationError::InvalidHex(s.to_string()))?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.to_hex()) }
}

impl fmt::Debug for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Checksum({})", self.to_hex())
    }
}
