//! Error types for the leveled logger

use std::io;
use std::path::PathBuf;

/// Result type for logger operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while setting up or driving a logger
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Failed to create log directory
    #[error("failed to create log directory at {}: {source}", path.display())]
    CreateDirectory {
        /// The path that failed to be created
        path: PathBuf,
        /// The underlying error
        source: io::Error,
    },

    /// Unknown level name
    #[error("invalid log level '{0}'. Valid levels are: debug, info, warn, error, none")]
    InvalidLevel(String),

    /// The logger has been closed
    #[error("logger closed")]
    Closed,

    /// The underlying writer failed
    #[error(transparent)]
    Writer(#[from] rlog::Error),
}
