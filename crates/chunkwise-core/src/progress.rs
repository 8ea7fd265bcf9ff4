use std::fmt;
use std::sync::Arc;

/// What just happened to the chunk named in a [`Progress`] report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Already present locally with a matching checksum.
    Skipped,
    /// Bytes arrived from the network.
    Downloading,
    /// Downloaded, checked and renamed into place.
    Verified,
}

/// Snapshot of a fetch batch, passed to the callback registered with
/// [`ChunkFetcher::on_progress`](crate::ChunkFetcher::on_progress).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress {
    pub phase:          Phase,
    pub chunk:          String,
    pub sequence_index: u64,
    pub chunks_total:   usize,
    /// Bytes of the batch accounted for so far, skipped chunks included.
    pub bytes_done:     u64,
    pub bytes_total:    u64,
}

impl Progress {
    pub fn percentage(&self) -> Option<f64> {
        (self.bytes_total > 0).then(|| self.bytes_done as f64 / self.bytes_total as f64 * 100.0)
    }
}

pub type ProgressCallback = Arc<dyn Fn(&Progress) + Send + Sync>;

/// Optional callback, debug-printable so it can sit in option structs.
#[derive(Clone, Default)]
pub(crate) struct ProgressHook(Option<ProgressCallback>);

impl ProgressHook {
    pub(crate) fn new(callback: ProgressCallback) -> Self { Self(Some(callback)) }

    pub(crate) fn emit(&self, progress: impl FnOnce() -> Progress) {
        if let Some(callback) = &self.0 {
            callback(&progress());
        }
    }
}

impl fmt::Debug for ProgressHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(if self.0.is_some() { "Some(..)" } else { "None" })
    }
}
