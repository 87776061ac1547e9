//! Error types for the rotating writer

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

/// Result type for writer operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while buffering, flushing or rotating.
///
/// The type is `Clone` because the first failure is latched and handed back,
/// unchanged, by every later call on the same writer.
#[derive(Clone, Debug, thiserror::Error)]
pub enum Error {
    /// The target directory does not exist
    #[error("directory {0:?} does not exist")]
    DirectoryNotFound(PathBuf),

    /// The target path exists but is not a directory
    #[error("path {0:?} is not a directory")]
    NotADirectory(PathBuf),

    /// A threshold was zero or otherwise unusable
    #[error("invalid writer options: {0}")]
    InvalidOptions(String),

    /// I/O operation failed
    #[error("{0}: {1}")]
    Io(&'static str, #[source] Arc<io::Error>),

    /// The writer has been closed
    #[error("log file {0:?} is closed")]
    Closed(PathBuf),
}

impl Error {
    pub(crate) fn io(context: &'static str, source: io::Error) -> Self {
        Self::Io(context, Arc::new(source))
    }

    /// Returns `true` if this error reports a closed writer.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        matches!(self, Self::Closed(_))
    }
}

impl From<Error> for io::Error {
    fn from(error: Error) -> Self {
        let kind = match &error {
            Error::DirectoryNotFound(_) => io::ErrorKind::NotFound,
            Error::NotADirectory(_) | Error::InvalidOptions(_) => io::ErrorKind::InvalidInput,
            Error::Io(_, source) => source.kind(),
            Error::Closed(_) => io::ErrorKind::BrokenPipe,
        };

        Self::new(kind, error)
    }
}
