//! Buffered, append-only log writer with size-based rotation.
//!
//! This crate provides the file-facing half of a logger:
//! - Small writes are batched in memory and flushed by size or age
//! - Every flush is synced to stable storage before returning
//! - `latest.log` is rotated into a microsecond-timestamped archive before it
//!   would reach its size limit
//! - The first I/O failure is latched and returned by every later call
//!
//! Formatting, level filtering and directory creation belong to the caller.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

mod buffer;
mod engine;
mod error;
mod event;
mod options;
mod strategy;
mod writer;

pub use engine::ACTIVE_FILE_NAME;
pub use error::{Error, Result};
pub use options::{
    DEFAULT_MAX_BUFFER_AGE, DEFAULT_MAX_BUFFER_SIZE, DEFAULT_MAX_FILE_SIZE, Options,
};
pub use strategy::{Strategy, Synchronized, Unsynchronized};
pub use writer::{SyncWriter, Writer};
