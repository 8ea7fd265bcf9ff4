//! Filesystem primitives for chunk artifacts.
//!
//! Every artifact is written through a [`StagedFile`]: bytes go to a hidden
//! temporary file in the destination directory and are renamed over the final
//! name only on commit. A crash or error mid-write leaves the destination
//! absent (or holding its previous complete content), never truncated.

mod dir;
mod error;
mod staged;

pub use dir::{ensure_dir, file_len, is_file, open, remove_if_exists};
pub use error::{Error, Result};
pub use staged::{AtomicWriteOptions, StagedFile, atomic_read, atomic_write};
