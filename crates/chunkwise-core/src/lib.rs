//! Integrity-preserving chunked transfer of large files.
//!
//! # Architecture
//!
//! - [`split`] cuts a file into fixed-size chunk artifacts and writes a
//!   [`Manifest`] naming each chunk with its size and SHA-256.
//! - [`ChunkFetcher`] brings the chunks of a manifest into a local directory
//!   over HTTP, skipping chunks that are already present and valid.
//! - [`reassemble`] concatenates the chunks in sequence order, verifying each
//!   one, into the original file.
//!
//! The manifest is the single source of truth for order and integrity: chunk
//! order always comes from the sequence index, never from array position or
//! directory listing order.
//!
//! # Example
//!
//! ```no_run
//! use chunkwise_core::{Manifest, ReassembleOptions, SplitOptions, reassemble, split};
//!
//! # fn main() -> chunkwise_core::Result<()> {
//! let outcome = split("game.zip", &SplitOptions::new("chunks").version("0.28"))?;
//! let manifest = Manifest::load(&outcome.manifest_path)?;
//! reassemble(&manifest, "chunks", "game-restored.zip", ReassembleOptions::new())?;
//! # Ok(())
//! # }
//! ```

mod error;
mod fetch;
mod manifest;
mod name;
mod progress;
mod reassemble;
mod split;

pub use error::{Error, ErrorKind, Result};
pub use fetch::{ChunkFetcher, FetchOutcome, FetchRequest, ManifestSource, Reassembly};
pub use manifest::{ChunkRecord, Manifest, manifest_file_name};
pub use name::{CHUNK_MARKER, DEFAULT_INDEX_WIDTH, chunk_name, parse_chunk_name, required_width};
pub use progress::{Phase, Progress, ProgressCallback};
pub use reassemble::{
    ChunkReport, ChunkStatus, ReassembleOptions, ReassembleOutcome, check_chunk, reassemble,
    verify_chunks, verify_file,
};
pub use split::{DEFAULT_CHUNK_SIZE, SplitOptions, SplitOutcome, split};

pub use chunkwise_verify::Checksum;
