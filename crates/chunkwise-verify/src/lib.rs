//! Content verification primitives for chunk artifacts.
//!
//! Hashing is incremental: data is digested as it streams through a reader or
//! writer, so a chunk is touched once whether it is being copied, split or
//! downloaded. Memory use is bounded by a fixed buffer regardless of input size.
//!
//! # Example
//!
//! ```
//! use chunkwise_verify::{Sha256Hasher, VerifiedReader};
//!
//! let data = b"hello world";
//! let expected = Sha256Hasher::digest(data);
//!
//! let mut reader = VerifiedReader::sha256(&data[..]);
//! std::io::copy(&mut reader, &mut std::io::sink()).unwrap();
//! reader.finish(&expected).unwrap();
//! ```

pub use self::error::{Result, VerificationError};
pub use self::hasher::{CHECKSUM_LEN, Checksum, Hasher, Sha256Hasher};
pub use self::reader::{BUF_SIZE, HashingWriter, VerifiedReader, digest, digest_file, verify_file};

mod error;
mod hasher;
mod reader;
