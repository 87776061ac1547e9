//! Public writer handle

use crate::engine::Engine;
use crate::event;
use crate::strategy::{Strategy, Synchronized, Unsynchronized};
use crate::{Options, Result};

use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

/// Buffered log writer that rotates `latest.log` into timestamped archives.
///
/// Bytes are accumulated in memory and written out when the buffer reaches
/// [`Options::max_buffer_size`], or on the first write after the buffer has
/// aged past [`Options::max_buffer_age`]. There is no background timer: an
/// idle writer keeps its bytes in memory until the next write, an explicit
/// [`flush`](Self::flush), or [`close`](Self::close).
///
/// The first failure is latched. Every later call returns it again and
/// performs no I/O.
///
/// ```no_run
/// use rlog::{Options, Writer};
///
/// # fn main() -> rlog::Result<()> {
/// let writer = Writer::open("logs", Options::default().with_max_file_size(1 << 30))?;
/// writer.write_bytes(b"Hello, log file!\n")?;
/// writer.flush()?;
/// writer.close()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Writer<S: Strategy = Unsynchronized> {
    engine: S,
    directory: PathBuf,
    active_path: PathBuf,
}

/// A writer that may be shared between threads.
pub type SyncWriter = Writer<Synchronized>;

impl Writer<Unsynchronized> {
    /// Opens a writer for single-threaded (or externally serialized) use.
    ///
    /// The directory must already exist. `latest.log` is created inside it if
    /// missing and opened for appending.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DirectoryNotFound`](crate::Error::DirectoryNotFound),
    /// [`Error::NotADirectory`](crate::Error::NotADirectory),
    /// [`Error::InvalidOptions`](crate::Error::InvalidOptions), or an I/O
    /// error if the active file cannot be opened.
    pub fn open(directory: impl AsRef<Path>, options: Options) -> Result<Self> {
        Self::with_strategy(directory.as_ref(), options)
    }
}

impl Writer<Synchronized> {
    /// Opens a writer whose operations are serialized by an internal mutex.
    ///
    /// # Errors
    ///
    /// Same as [`Writer::open`].
    pub fn open_synchronized(directory: impl AsRef<Path>, options: Options) -> Result<Self> {
        Self::with_strategy(directory.as_ref(), options)
    }
}

impl<S: Strategy> Writer<S> {
    fn with_strategy(directory: &Path, options: Options) -> Result<Self> {
        let engine = Engine::open(directory, options)?;
        let directory = engine.directory().to_path_buf();
        let active_path = engine.active_path().to_path_buf();

        debug!(path = %active_path.display(), ?options, "opened log writer");

        Ok(Self {
            engine: S::new(engine),
            directory,
            active_path,
        })
    }

    /// Runs `op` under the strategy's lock, then emits whatever diagnostics
    /// it raised. Nothing is logged while the lock is held, so a subscriber
    /// writing into this same writer cannot deadlock on it.
    fn run<R>(&self, op: impl FnOnce(&mut Engine) -> R) -> R {
        let (result, events) = self.engine.with(|engine| {
            let result = op(engine);
            (result, engine.take_events())
        });
        event::emit_all(events);
        result
    }

    /// Appends `bytes` and flushes if a threshold is met.
    ///
    /// Returns `bytes.len()`; partial writes never happen.
    ///
    /// # Errors
    ///
    /// Returns the latched error, a closed error, or the failure of the
    /// flush this call triggered.
    pub fn write_bytes(&self, bytes: &[u8]) -> Result<usize> {
        self.run(|engine| engine.write(bytes))
    }

    /// Writes every pending byte to `latest.log` and syncs it to disk,
    /// rotating first if the file would reach its size limit.
    ///
    /// # Errors
    ///
    /// Returns the latched error, a closed error, or the stat, rotate, write
    /// or sync failure of this flush.
    pub fn flush(&self) -> Result<()> {
        self.run(Engine::flush)
    }

    /// Flushes and releases the active file.
    ///
    /// Always check the result: it is where a final flush failure surfaces.
    /// Closing twice returns [`Error::Closed`](crate::Error::Closed).
    ///
    /// # Errors
    ///
    /// Returns the flush error if there was one, otherwise the close error.
    pub fn close(&self) -> Result<()> {
        self.run(Engine::close)
    }

    /// Replaces the thresholds of a live writer, keeping pending bytes.
    ///
    /// # Errors
    ///
    /// Returns the latched or closed error, or
    /// [`Error::InvalidOptions`](crate::Error::InvalidOptions).
    pub fn reconfigure(&self, options: Options) -> Result<()> {
        self.run(|engine| engine.reconfigure(options))
    }

    /// Number of bytes accepted but not yet flushed.
    pub fn buffered_len(&self) -> usize {
        self.engine.with(|engine| engine.buffered_len())
    }

    /// Directory holding the active and archived files.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Path of `latest.log`.
    pub fn active_path(&self) -> &Path {
        &self.active_path
    }
}

impl<S: Strategy> io::Write for Writer<S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.run(|engine| engine.write(buf)).map_err(Into::into)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.run(Engine::flush).map_err(Into::into)
    }
}

impl<S: Strategy> io::Write for &Writer<S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.run(|engine| engine.write(buf)).map_err(Into::into)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.run(Engine::flush).map_err(Into::into)
    }
}

impl<S: Strategy> Drop for Writer<S> {
    fn drop(&mut self) {
        self.run(Engine::flush_before_drop);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn test_strategy_thread_bounds() {
        assert_send::<Writer>();
        assert_send::<SyncWriter>();
        assert_sync::<SyncWriter>();
    }
}
