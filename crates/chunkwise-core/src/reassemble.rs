use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use chunkwise_fs::{AtomicWriteOptions, StagedFile};
use chunkwise_verify::{BUF_SIZE, Checksum, HashingWriter, VerificationError, VerifiedReader};

use crate::error::{Error, Result};
use crate::manifest::{ChunkRecord, Manifest};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReassembleOptions {
    verify: bool,
    sync:   bool,
}

impl Default for ReassembleOptions {
    fn default() -> Self { Self::new() }
}

impl ReassembleOptions {
    pub fn new() -> Self {
        Self {
            verify: true,
            sync:   true,
        }
    }

    /// Check every chunk against its recorded checksum while copying.
    /// Sizes are always checked.
    #[must_use]
    pub fn verify(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }

    #[must_use]
    pub fn sync(mut self, sync: bool) -> Self {
        self.sync = sync;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReassembleOutcome {
    pub path:          PathBuf,
    pub bytes_written: u64,
    /// SHA-256 of the whole reassembled file.
    pub checksum:      Checksum,
}

/// Concatenate the manifest's chunks, in sequence order, into `output`.
///
/// The output is built in a staged file beside `output` and renamed into place
/// only after every chunk has been copied and checked, so an integrity failure
/// never leaves a completed (or half-written) file at `output`.
#[tracing::instrument(skip_all, fields(output = %output.as_ref().display(), chunks = manifest.len()))]
pub fn reassemble(
    manifest: &Manifest,
    chunk_dir: impl AsRef<Path>,
    output: impl AsRef<Path>,
    options: ReassembleOptions,
) -> Result<ReassembleOutcome> {
    let chunk_dir = chunk_dir.as_ref();
    let output = output.as_ref();

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        chunkwise_fs::ensure_dir(parent)?;
    }

    let staged = StagedFile::new(output, AtomicWriteOptions::new().sync(options.sync))?;
    let mut writer = HashingWriter::sha256(BufWriter::with_capacity(BUF_SIZE, staged));

    for record in manifest {
        append_chunk(record, &chunk_dir.join(&record.name), output, &mut writer, options.verify)?;
    }

    let (buffered, checksum, bytes_written) = writer.finish();
    let staged = buffered
        .into_inner()
        .map_err(|e| Error::io(output)(e.into_error()))?;

    debug_assert_eq!(bytes_written, manifest.total_size());
    let path = staged.commit()?;

    tracing::info!(bytes_written, %checksum, "reassembly complete");
    Ok(ReassembleOutcome {
        path,
        bytes_written,
        checksum,
    })
}

fn append_chunk<W: Write>(
    record: &ChunkRecord,
    chunk_path: &Path,
    output: &Path,
    writer: &mut W,
    verify: bool,
) -> Result<()> {
    let file = chunkwise_fs::open(chunk_path)?;
    let mut reader = VerifiedReader::sha256(file);

    let copied = copy(&mut reader, writer, chunk_path, output)?;
    if copied != record.size {
        return Err(Error::SizeMismatch {
            chunk:    record.name.clone(),
            index:    record.sequence_index,
            expected: record.size,
            actual:   copied,
        });
    }

    if verify {
        match reader.finish(&record.checksum) {
            Ok(_) => {}
            Err(VerificationError::Mismatch { expected, actual }) => {
                return Err(Error::Integrity {
                    chunk: record.name.clone(),
                    index: record.sequence_index,
                    expected,
                    actual,
                });
            }
            Err(e) => return Err(Error::io(chunk_path)(io::Error::other(e))),
        }
    }
    tracing::debug!(chunk = %record.name, size = copied, "appended chunk");
    Ok(())
}

/// Stream copy that attributes failures to the side they happened on.
fn copy<R: Read, W: Write>(
    reader: &mut R,
    writer: &mut W,
    from: &Path,
    to: &Path,
) -> Result<u64> {
    let mut buf = vec![0u8; BUF_SIZE];
    let mut total = 0u64;
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => return Ok(total),
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(Error::io(from)(e)),
        };
        writer.write_all(&buf[..n]).map_err(Error::io(to))?;
        total += n as u64;
    }
}

/// State of one chunk artifact on disk relative to its record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkStatus {
    Valid,
    Missing,
    WrongSize { actual: u64 },
    Corrupt { actual: Checksum },
}

impl ChunkStatus {
    pub fn is_valid(&self) -> bool { matches!(self, ChunkStatus::Valid) }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkReport {
    pub name:           String,
    pub sequence_index: u64,
    pub status:         ChunkStatus,
}

/// Check a single local artifact against its record.
///
/// A wrong size is reported without hashing the file.
pub fn check_chunk(record: &ChunkRecord, path: &Path) -> Result<ChunkStatus> {
    if !chunkwise_fs::is_file(path) {
        return Ok(ChunkStatus::Missing);
    }
    let actual_size = chunkwise_fs::file_len(path)?;
    if actual_size != record.size {
        return Ok(ChunkStatus::WrongSize {
            actual: actual_size,
        });
    }
    let actual = chunkwise_verify::digest_file(path).map_err(Error::io(path))?;
    if actual == record.checksum {
        Ok(ChunkStatus::Valid)
    } else {
        Ok(ChunkStatus::Corrupt { actual })
    }
}

/// Check every chunk of `manifest` in `chunk_dir` without producing output.
pub fn verify_chunks(manifest: &Manifest, chunk_dir: impl AsRef<Path>) -> Result<Vec<ChunkReport>> {
    let chunk_dir = chunk_dir.as_ref();
    manifest
        .iter()
        .map(|record| {
            Ok(ChunkReport {
                name:           record.name.clone(),
                sequence_index: record.sequence_index,
                status:         check_chunk(record, &chunk_dir.join(&record.name))?,
            })
        })
        .collect()
}

/// Whole-file comparison, for checking a reassembled file against the
/// checksum of the original.
pub fn verify_file(path: impl AsRef<Path>, expected: &Checksum) -> Result<bool> {
    let path = path.as_ref();
    match chunkwise_verify::verify_file(path, expected) {
        Ok(_) => Ok(true),
        Err(VerificationError::Mismatch { .. }) => Ok(false),
        Err(VerificationError::Io(source)) => Err(Error::io(path)(source)),
        Err(e) => Err(Error::io(path)(io::Error::other(e))),
    }
}

#[cfg(test)]
mod tests {
    use chunkwise_verify::Sha256Hasher;
    use tempfile::tempdir;

    use super::*;
    use crate::split::{SplitOptions, split};

    fn split_fixture(data: &[u8], chunk_size: u64) -> (tempfile::TempDir, Manifest, PathBuf) {
        let dir = tempdir().unwrap();
        let source = dir.path().join("src.bin");
        std::fs::write(&source, data).unwrap();
        let out = dir.path().join("chunks");
        let outcome =
            split(&source, &SplitOptions::new(&out).chunk_size(chunk_size).sync(false)).unwrap();
        (dir, outcome.manifest, out)
    }

    #[test]
    fn test_reassemble_reports_whole_file_checksum() {
        let data = b"the quick brown fox jumps over the lazy dog".repeat(10);
        let (dir, manifest, chunks) = split_fixture(&data, 64);
        let output = dir.path().join("restored.bin");

        let outcome = reassemble(&manifest, &chunks, &output, ReassembleOptions::new()).unwrap();
        assert_eq!(outcome.bytes_written, data.len() as u64);
        assert_eq!(outcome.checksum, Sha256Hasher::digest(&data));
        assert!(verify_file(&output, &Sha256Hasher::digest(&data)).unwrap());
    }

    #[test]
    fn test_verify_file_reports_mismatch_and_missing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("restored.bin");
        std::fs::write(&path, b"payload").unwrap();

        assert!(verify_file(&path, &Sha256Hasher::digest(b"payload")).unwrap());
        assert!(!verify_file(&path, &Sha256Hasher::digest(b"other")).unwrap());

        let err = verify_file(dir.path().join("absent.bin"), &Sha256Hasher::digest(b"payload")).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Io);
    }

    #[test]
    fn test_missing_chunk_is_io_failure() {
        let (dir, manifest, chunks) = split_fixture(&[5u8; 300], 100);
        std::fs::remove_file(chunks.join(&manifest.records()[1].name)).unwrap();

        let output = dir.path().join("out.bin");
        let err = reassemble(&manifest, &chunks, &output, ReassembleOptions::new()).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Io);
        assert!(!output.exists());
    }

    #[test]
    fn test_truncated_chunk_is_size_mismatch_even_without_verify() {
        let (dir, manifest, chunks) = split_fixture(&[5u8; 300], 100);
        let victim = chunks.join(&manifest.records()[2].name);
        std::fs::write(&victim, [5u8; 40]).unwrap();

        let output = dir.path().join("out.bin");
        let err = reassemble(&manifest, &chunks, &output, ReassembleOptions::new().verify(false))
            .unwrap_err();
        assert!(matches!(err, Error::SizeMismatch { index: 2, expected: 100, actual: 40, .. }));
        assert!(!output.exists());
    }

    #[test]
    fn test_verify_chunks_statuses() {
        let (_dir, manifest, chunks) = split_fixture(&(0..=255u8).collect::<Vec<_>>(), 64);
        let records = manifest.records();
        std::fs::remove_file(chunks.join(&records[0].name)).unwrap();
        std::fs::write(chunks.join(&records[1].name), [0u8; 10]).unwrap();
        std::fs::write(chunks.join(&records[2].name), [0u8; 64]).unwrap();

        let reports = verify_chunks(&manifest, &chunks).unwrap();
        assert_eq!(reports[0].status, ChunkStatus::Missing);
        assert_eq!(reports[1].status, ChunkStatus::WrongSize { actual: 10 });
        assert!(matches!(reports[2].status, ChunkStatus::Corrupt { .. }));
        assert!(reports[3].status.is_valid());
    }

    #[test]
    fn test_empty_manifest_yields_empty_file() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("nested/empty.bin");
        let outcome =
            reassemble(&Manifest::default(), dir.path(), &output, ReassembleOptions::new()).unwrap();
        assert_eq!(outcome.bytes_written, 0);
        assert_eq!(std::fs::read(&output).unwrap(), b"");
    }
}
