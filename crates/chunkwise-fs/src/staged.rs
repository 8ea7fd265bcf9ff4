use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::{Error, Result};

#[derive(Clone, Copy, Debug)]
pub struct AtomicWriteOptions {
    prefix: &'static str,
    suffix: &'static str,
    sync:   bool,
}

impl Default for AtomicWriteOptions {
    fn default() -> Self { Self::new() }
}

impl AtomicWriteOptions {
    pub fn new() -> Self {
        Self {
            prefix: ".",
            suffix: ".part",
            sync:   true,
        }
    }

    pub fn prefix(mut self, prefix: &'static str) -> Self {
        self.prefix = prefix;
        self
    }

    pub fn suffix(mut self, suffix: &'static str) -> Self {
        self.suffix = suffix;
        self
    }

    /// Whether to fsync the staged file before it is renamed into place.
    pub fn sync(mut self, sync: bool) -> Self {
        self.sync = sync;
        self
    }
}

/// A file written next to its destination and renamed into place on commit.
///
/// Until [`StagedFile::commit`] succeeds the destination is untouched. Dropping
/// an uncommitted stage removes the temporary file, so an interrupted write
/// never leaves a truncated artifact under the final name.
pub struct StagedFile {
    temp:        NamedTempFile,
    destination: PathBuf,
    sync:        bool,
}

impl StagedFile {
    pub fn new(destination: impl AsRef<Path>, options: AtomicWriteOptions) -> Result<Self> {
        let destination = destination.as_ref().to_path_buf();
        let parent = parent_dir(&destination)?;

        let temp = tempfile::Builder::new()
            .prefix(options.prefix)
            .suffix(options.suffix)
            .tempfile_in(parent)
            .map_err(|source| Error::Write {
                path: parent.to_path_buf(),
                source,
            })?;

        tracing::trace!(staging = %temp.path().display(), destination = %destination.display(), "staged file");
        Ok(Self {
            temp,
            destination,
            sync: options.sync,
        })
    }

    /// Path of the temporary file being written.
    pub fn path(&self) -> &Path { self.temp.path() }

    pub fn destination(&self) -> &Path { &self.destination }

    pub fn as_file(&self) -> &File { self.temp.as_file() }

    pub fn as_file_mut(&mut self) -> &mut File { self.temp.as_file_mut() }

    /// Rename the staged file over the destination.
    pub fn commit(mut self) -> Result<PathBuf> {
        let write_err = |path: &Path, source: io::Error| Error::Write {
            path: path.to_path_buf(),
            source,
        };

        self.temp
            .as_file_mut()
            .flush()
            .map_err(|e| write_err(&self.destination, e))?;
        if self.sync {
            self.temp
                .as_file()
                .sync_all()
                .map_err(|e| write_err(&self.destination, e))?;
        }

        let destination = self.destination;
        self.temp
            .persist(&destination)
            .map_err(|e| write_err(&destination, e.error))?;
        Ok(destination)
    }
}

impl Write for StagedFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> { self.temp.as_file_mut().write(buf) }

    fn flush(&mut self) -> io::Result<()> { self.temp.as_file_mut().flush() }
}

pub fn atomic_write(
    path: impl AsRef<Path>,
    content: &[u8],
    options: AtomicWriteOptions,
) -> Result<()> {
    let mut staged = StagedFile::new(path, options)?;
    staged.write_all(content).map_err(|source| Error::Write {
        path: staged.destination().to_path_buf(),
        source,
    })?;
    staged.commit()?;
    Ok(())
}

pub fn atomic_read(path: impl AsRef<Path>) -> Result<Vec<u8>> {
    let path = path.as_ref();
    std::fs::read(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn parent_dir(path: &Path) -> Result<&Path> {
    match path.parent() {
        Some(parent) if parent.as_os_str().is_empty() => Ok(Path::new(".")),
        Some(parent) => Ok(parent),
        None => Err(Error::NoParent {
            path: path.to_path_buf(),
        }),
    }
}
