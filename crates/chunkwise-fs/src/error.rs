use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read {}", path.display())]
    Read {
        path:   PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {}", path.display())]
    Write {
        path:   PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to create directory {}", path.display())]
    CreateDir {
        path:   PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to remove {}", path.display())]
    Remove {
        path:   PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{} has no parent directory", path.display())]
    NoParent { path: PathBuf },
}

impl Error {
    pub fn path(&self) -> &std::path::Path {
        match self {
            Error::Read { path, .. }
            | Error::Write { path, .. }
            | Error::CreateDir { path, .. }
            | Error::Remove { path, .. }
            | Error::NoParent { path } => path,
        }
    }

    pub fn io_kind(&self) -> Option<io::ErrorKind> {
        match self {
            Error::Read { source, .. }
            | Error::Write { source, .. }
            | Error::CreateDir { source, .. }
            | Error::Remove { source, .. } => Some(source.kind()),
            Error::NoParent { .. } => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
