use std::path::{Path, PathBuf};

use chunkwise_fetch::{HttpClient, TransportError, join_url};
use chunkwise_fs::{AtomicWriteOptions, StagedFile};
use chunkwise_verify::{Hasher, Sha256Hasher};
use futures_util::TryStreamExt;
use tokio::io::AsyncWriteExt;

use crate::error::{Error, Result};
use crate::manifest::{ChunkRecord, Manifest, manifest_file_name};
use crate::progress::{Phase, Progress, ProgressCallback, ProgressHook};
use crate::reassemble::{ChunkStatus, ReassembleOptions, ReassembleOutcome, check_chunk, reassemble};

/// Where the manifest comes from.
#[derive(Debug, Clone)]
pub enum ManifestSource {
    Url(String),
    Path(PathBuf),
    Inline(Manifest),
}

impl ManifestSource {
    /// `http://` and `https://` locations are URLs, anything else is a path.
    pub fn parse(location: &str) -> Self {
        if location.starts_with("http://") || location.starts_with("https://") {
            ManifestSource::Url(location.to_string())
        } else {
            ManifestSource::Path(PathBuf::from(location))
        }
    }
}

/// What to do once every chunk is present and verified.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Reassembly {
    #[default]
    Skip,
    /// Reassemble into `local_dir/<original file name>`.
    Default,
    To(PathBuf),
}

#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub manifest:   ManifestSource,
    /// Location the chunk artifacts are served under; chunk URLs are
    /// `base_url + "/" + name`.
    pub base_url:   String,
    pub local_dir:  PathBuf,
    pub reassembly: Reassembly,
}

impl FetchRequest {
    pub fn new(
        manifest: ManifestSource,
        base_url: impl Into<String>,
        local_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            manifest,
            base_url: base_url.into(),
            local_dir: local_dir.into(),
            reassembly: Reassembly::Skip,
        }
    }

    #[must_use]
    pub fn reassemble(mut self, reassembly: Reassembly) -> Self {
        self.reassembly = reassembly;
        self
    }
}

#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub manifest:    Manifest,
    /// Local path of every chunk, in sequence order.
    pub chunk_paths: Vec<PathBuf>,
    /// Chunks that had to be retrieved over the network.
    pub downloaded:  usize,
    /// Chunks already present locally with a matching checksum.
    pub skipped:     usize,
    pub reassembled: Option<ReassembleOutcome>,
}

/// Retrieves the chunks of a manifest into a local directory.
///
/// Chunks already present with a matching checksum are not downloaded again,
/// so an interrupted batch is resumed by running the same request again. The
/// first transport or integrity failure aborts the batch and leaves every chunk
/// verified so far in place.
pub struct ChunkFetcher<C: HttpClient> {
    client:   C,
    options:  ReassembleOptions,
    sync:     bool,
    progress: ProgressHook,
}

impl<C: HttpClient> ChunkFetcher<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            options: ReassembleOptions::new(),
            sync: true,
            progress: ProgressHook::default(),
        }
    }

    /// Options for the optional reassembly step, used as given. Download
    /// durability is set separately with [`sync`](Self::sync).
    #[must_use]
    pub fn with_reassemble_options(mut self, options: ReassembleOptions) -> Self {
        self.options = options;
        self
    }

    /// Whether downloaded chunks are fsynced before being renamed into place.
    /// Does not touch the reassembly options.
    #[must_use]
    pub fn sync(mut self, sync: bool) -> Self {
        self.sync = sync;
        self
    }

    /// Report per-chunk and per-piece progress to `callback`.
    #[must_use]
    pub fn on_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = ProgressHook::new(callback);
        self
    }

    fn report(&self, phase: Phase, record: &ChunkRecord, manifest: &Manifest, bytes_done: u64) {
        self.progress.emit(|| Progress {
            phase,
            chunk: record.name.clone(),
            sequence_index: record.sequence_index,
            chunks_total: manifest.len(),
            bytes_done,
            bytes_total: manifest.total_size(),
        });
    }

    #[tracing::instrument(skip_all, fields(base_url = %request.base_url, local_dir = %request.local_dir.display()))]
    pub async fn fetch(&self, request: &FetchRequest) -> Result<FetchOutcome> {
        chunkwise_fs::ensure_dir(&request.local_dir)?;
        let manifest = self.load_manifest(&request.manifest, &request.local_dir).await?;
        tracing::info!(chunks = manifest.len(), total_size = manifest.total_size(), "manifest loaded");

        let mut chunk_paths = Vec::with_capacity(manifest.len());
        let mut downloaded = 0;
        let mut skipped = 0;
        let mut bytes_done = 0u64;

        for record in &manifest {
            let path = request.local_dir.join(&record.name);

            match local_status(record, &path).await? {
                ChunkStatus::Valid => {
                    tracing::info!(chunk = %record.name, "already present with matching checksum, skipping");
                    skipped += 1;
                    bytes_done += record.size;
                    self.report(Phase::Skipped, record, &manifest, bytes_done);
                    chunk_paths.push(path);
                    continue;
                }
                ChunkStatus::Missing => {}
                stale => {
                    tracing::warn!(chunk = %record.name, status = ?stale, "local chunk is stale, downloading again");
                    chunkwise_fs::remove_if_exists(&path)?;
                }
            }

            let url = join_url(&request.base_url, &record.name);
            self.download(record, &url, &path, |received| {
                self.report(Phase::Downloading, record, &manifest, bytes_done + received)
            })
            .await?;
            bytes_done += record.size;
            self.report(Phase::Verified, record, &manifest, bytes_done);
            downloaded += 1;
            chunk_paths.push(path);
        }

        tracing::info!(downloaded, skipped, "all chunks verified");

        let reassembled = match &request.reassembly {
            Reassembly::Skip => None,
            Reassembly::Default => {
                let name = manifest.original_name().unwrap_or("reassembled.bin");
                Some(self.reassemble(&manifest, &request.local_dir, request.local_dir.join(name)).await?)
            }
            Reassembly::To(output) => {
                Some(self.reassemble(&manifest, &request.local_dir, output.clone()).await?)
            }
        };

        Ok(FetchOutcome {
            manifest,
            chunk_paths,
            downloaded,
            skipped,
            reassembled,
        })
    }

    async fn load_manifest(&self, source: &ManifestSource, local_dir: &Path) -> Result<Manifest> {
        match source {
            ManifestSource::Inline(manifest) => Ok(manifest.clone()),
            ManifestSource::Path(path) => Manifest::load(path),
            ManifestSource::Url(url) => {
                tracing::info!(url, "downloading manifest");
                let text = self.client.get_text(url).await.map_err(|source| Error::Transport {
                    what: "manifest".to_string(),
                    source,
                })?;
                let manifest = Manifest::from_json(text.as_bytes())?;

                // Keep a local copy so the directory can be reassembled offline.
                let name = manifest_name_from_url(url)
                    .unwrap_or_else(|| manifest_file_name(manifest.version()));
                manifest.save(local_dir.join(name))?;
                Ok(manifest)
            }
        }
    }

    /// Stream one chunk into a staged file, hashing on the way, and commit it
    /// only if the checksum matches. A body longer than the record is cut off
    /// at the first piece that would overrun it.
    async fn download(
        &self,
        record: &ChunkRecord,
        url: &str,
        destination: &Path,
        on_piece: impl Fn(u64),
    ) -> Result<()> {
        tracing::info!(chunk = %record.name, url, "downloading");
        let transport = |source: TransportError| Error::Transport {
            what: format!("chunk {}", record.name),
            source,
        };

        let mut stream = self.client.stream(url).await.map_err(transport)?;

        let staged = StagedFile::new(destination, AtomicWriteOptions::new().sync(self.sync))?;
        let handle = staged.as_file().try_clone().map_err(Error::io(staged.path()))?;
        let mut file = tokio::fs::File::from_std(handle);
        let mut hasher = Sha256Hasher::new();
        let mut received = 0u64;

        while let Some(piece) = stream.try_next().await.map_err(transport)? {
            let total = received.saturating_add(piece.len() as u64);
            if total > record.size {
                tracing::warn!(chunk = %record.name, expected = record.size, "body longer than manifest size");
                return Err(Error::SizeMismatch {
                    chunk:    record.name.clone(),
                    index:    record.sequence_index,
                    expected: record.size,
                    actual:   total,
                });
            }
            hasher.update(&piece);
            file.write_all(&piece).await.map_err(Error::io(destination))?;
            received = total;
            on_piece(received);
        }
        file.flush().await.map_err(Error::io(destination))?;
        drop(file);

        let actual = hasher.finalize();
        if actual != record.checksum {
            return Err(Error::Integrity {
                chunk: record.name.clone(),
                index: record.sequence_index,
                expected: record.checksum,
                actual,
            });
        }
        if received != record.size {
            return Err(Error::SizeMismatch {
                chunk:    record.name.clone(),
                index:    record.sequence_index,
                expected: record.size,
                actual:   received,
            });
        }

        tokio::task::spawn_blocking(move || staged.commit()).await??;
        tracing::debug!(chunk = %record.name, bytes = received, "chunk verified");
        Ok(())
    }

    async fn reassemble(
        &self,
        manifest: &Manifest,
        chunk_dir: &Path,
        output: PathBuf,
    ) -> Result<ReassembleOutcome> {
        let manifest = manifest.clone();
        let chunk_dir = chunk_dir.to_path_buf();
        let options = self.options;
        tokio::task::spawn_blocking(move || reassemble(&manifest, &chunk_dir, &output, options))
            .await?
    }
}

async fn local_status(record: &ChunkRecord, path: &Path) -> Result<ChunkStatus> {
    if !chunkwise_fs::is_file(path) {
        return Ok(ChunkStatus::Missing);
    }
    let record = record.clone();
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || check_chunk(&record, &path)).await?
}

/// Last path segment of a manifest URL, if it looks like a file name.
fn manifest_name_from_url(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next()?;
    let (_, last) = path.rsplit_once('/')?;
    (last.ends_with(".json") && !last.contains("..")).then(|| last.to_string())
}
