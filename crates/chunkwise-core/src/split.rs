use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use chunkwise_fs::{AtomicWriteOptions, StagedFile};
use chunkwise_verify::{BUF_SIZE, HashingWriter};

use crate::error::{Error, Result};
use crate::manifest::{ChunkRecord, Manifest, manifest_file_name};
use crate::name::{DEFAULT_INDEX_WIDTH, chunk_name, required_width};

/// Default chunk size: 100 MiB.
pub const DEFAULT_CHUNK_SIZE: u64 = 100 * 1024 * 1024;

/// Configuration for [`split`].
///
/// # Examples
///
/// ```
/// use chunkwise_core::SplitOptions;
///
/// let options = SplitOptions::new("out")
///     .chunk_size(64 * 1024 * 1024)
///     .version("0.28");
/// assert_eq!(options.get_chunk_size(), 64 * 1024 * 1024);
/// ```
#[derive(Debug, Clone)]
pub struct SplitOptions {
    output_dir:  PathBuf,
    chunk_size:  u64,
    version:     Option<String>,
    index_width: usize,
    sync:        bool,
}

impl SplitOptions {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir:  output_dir.into(),
            chunk_size:  DEFAULT_CHUNK_SIZE,
            version:     None,
            index_width: DEFAULT_INDEX_WIDTH,
            sync:        true,
        }
    }

    #[must_use]
    pub fn chunk_size(mut self, chunk_size: u64) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Batch tag recorded on every chunk and in the manifest's file name.
    #[must_use]
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Minimum zero-padding of the index suffix. Widened automatically when
    /// the chunk count needs more digits.
    #[must_use]
    pub fn index_width(mut self, index_width: usize) -> Self {
        self.index_width = index_width;
        self
    }

    /// Whether each artifact is fsynced before being renamed into place.
    #[must_use]
    pub fn sync(mut self, sync: bool) -> Self {
        self.sync = sync;
        self
    }

    pub fn get_chunk_size(&self) -> u64 { self.chunk_size }

    pub fn get_output_dir(&self) -> &Path { &self.output_dir }
}

#[derive(Debug, Clone)]
pub struct SplitOutcome {
    pub manifest_path: PathBuf,
    pub manifest:      Manifest,
}

/// Split `source` into fixed-size chunk artifacts plus a manifest, all written
/// to the configured output directory.
///
/// Each chunk is streamed through the hasher into a staged file and renamed
/// into place once complete, so memory use is bounded by a small buffer and a
/// failed run never leaves a truncated chunk under its final name. An empty
/// source yields an empty manifest and no chunk artifacts.
#[tracing::instrument(skip_all, fields(source = %source.as_ref().display()))]
pub fn split(source: impl AsRef<Path>, options: &SplitOptions) -> Result<SplitOutcome> {
    let source = source.as_ref();
    if options.chunk_size == 0 {
        return Err(Error::InvalidArgument("chunk size must be greater than zero".into()));
    }

    let base_name = source
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            Error::InvalidArgument(format!("{} has no UTF-8 file name", source.display()))
        })?;

    let file = chunkwise_fs::open(source)?;
    let file_size = file.metadata().map_err(Error::io(source))?.len();
    let num_chunks = file_size.div_ceil(options.chunk_size);

    let width = options.index_width.max(required_width(num_chunks));
    if width > options.index_width {
        tracing::warn!(
            requested = options.index_width,
            width,
            num_chunks,
            "index width too narrow for chunk count, widening"
        );
    }

    chunkwise_fs::ensure_dir(&options.output_dir)?;
    tracing::info!(file_size, chunk_size = options.chunk_size, num_chunks, "splitting");

    let mut reader = file;
    let mut buf = vec![0u8; BUF_SIZE];
    let mut records = Vec::with_capacity(num_chunks as usize);
    let mut remaining = file_size;

    for index in 0..num_chunks {
        let expected = remaining.min(options.chunk_size);
        let name = chunk_name(base_name, index, width);
        let record = write_chunk(&mut reader, &mut buf, source, &name, index, expected, options)?;
        tracing::debug!(chunk = %record.name, size = record.size, checksum = %record.checksum, "wrote chunk");
        remaining -= expected;
        records.push(record);
    }

    let manifest = Manifest::new(records)?;
    let manifest_path = options
        .output_dir
        .join(manifest_file_name(options.version.as_deref()));
    manifest.save(&manifest_path)?;

    tracing::info!(chunks = manifest.len(), manifest = %manifest_path.display(), "split complete");
    Ok(SplitOutcome {
        manifest_path,
        manifest,
    })
}

fn write_chunk(
    reader: &mut File,
    buf: &mut [u8],
    source: &Path,
    name: &str,
    index: u64,
    expected: u64,
    options: &SplitOptions,
) -> Result<ChunkRecord> {
    let destination = options.output_dir.join(name);
    let staged = StagedFile::new(&destination, AtomicWriteOptions::new().sync(options.sync))?;
    let mut writer = HashingWriter::sha256(staged);

    let mut remaining = expected;
    while remaining > 0 {
        let want = remaining.min(buf.len() as u64) as usize;
        let n = match reader.read(&mut buf[..want]) {
            Ok(0) => {
                return Err(Error::io(source)(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!(
                        "source ended {remaining} bytes short of chunk {name} ({expected} bytes)"
                    ),
                )));
            }
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(Error::io(source)(e)),
        };
        writer.write_all(&buf[..n]).map_err(Error::io(&destination))?;
        remaining -= n as u64;
    }
    writer.flush().map_err(Error::io(&destination))?;

    let (staged, checksum, size) = writer.finish();
    staged.commit()?;

    Ok(ChunkRecord {
        name: name.to_string(),
        sequence_index: index,
        size,
        checksum,
        version: options.version.clone(),
    })
}

#[cfg(test)]
mod tests {
    use chunkwise_verify::{Sha256Hasher, digest_file};
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_zero_chunk_size_rejected() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("f");
        std::fs::write(&source, b"abc").unwrap();
        let err = split(&source, &SplitOptions::new(dir.path()).chunk_size(0)).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn test_missing_source_is_io_failure() {
        let dir = tempdir().unwrap();
        let err = split(dir.path().join("nope"), &SplitOptions::new(dir.path())).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Io);
    }

    #[test]
    fn test_exact_multiple_has_no_empty_tail() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("f.bin");
        std::fs::write(&source, vec![1u8; 30]).unwrap();

        let out = dir.path().join("out");
        let outcome = split(&source, &SplitOptions::new(&out).chunk_size(10).sync(false)).unwrap();
        let sizes: Vec<u64> = outcome.manifest.iter().map(|r| r.size).collect();
        assert_eq!(sizes, vec![10, 10, 10]);
    }

    #[test]
    fn test_chunk_artifacts_match_records() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("data.bin");
        let data: Vec<u8> = (0..2500u32).map(|i| (i * 7 % 256) as u8).collect();
        std::fs::write(&source, &data).unwrap();

        let out = dir.path().join("out");
        let outcome =
            split(&source, &SplitOptions::new(&out).chunk_size(1000).version("1.0")).unwrap();

        assert_eq!(outcome.manifest_path, out.join("manifest_1.0.json"));
        for (record, expected) in outcome.manifest.iter().zip(data.chunks(1000)) {
            let path = out.join(&record.name);
            assert_eq!(std::fs::read(&path).unwrap(), expected);
            assert_eq!(record.checksum, Sha256Hasher::digest(expected));
            assert_eq!(digest_file(&path).unwrap(), record.checksum);
            assert_eq!(record.version.as_deref(), Some("1.0"));
        }
        assert_eq!(outcome.manifest.records()[0].name, "data.bin_chunk_00000");
    }

    #[test]
    fn test_narrow_width_is_widened() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("f");
        std::fs::write(&source, vec![0u8; 12]).unwrap();

        let out = dir.path().join("out");
        let outcome =
            split(&source, &SplitOptions::new(&out).chunk_size(1).index_width(1).sync(false))
                .unwrap();
        let names: Vec<&str> = outcome.manifest.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names[0], "f_chunk_00");
        assert_eq!(names[11], "f_chunk_11");

        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(sorted, names);
    }

    #[test]
    fn test_no_staging_files_left_behind() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("f");
        std::fs::write(&source, vec![9u8; 25]).unwrap();

        let out = dir.path().join("out");
        split(&source, &SplitOptions::new(&out).chunk_size(10)).unwrap();

        let mut entries: Vec<String> = std::fs::read_dir(&out)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        entries.sort();
        assert_eq!(entries, vec!["f_chunk_00000", "f_chunk_00001", "f_chunk_00002", "manifest.json"]);
    }
}
