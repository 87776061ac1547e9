//! Leveled logger writing through a synchronized rotating writer

use crate::{Error, Level, Result};

use std::fmt::{self, Write as _};
use std::fs;
use std::panic::Location;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use chrono::Local;
use parking_lot::Mutex;
use rlog::{Options, SyncWriter};

const DATE_TIME_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// Level-filtered text logger on top of [`rlog::SyncWriter`].
///
/// Every line is prefixed with the process id, the level and the local time.
/// Debug lines also carry the caller's `file:line`.
///
/// ```no_run
/// use rlog_logger::{Level, Logger};
///
/// # fn main() -> rlog_logger::Result<()> {
/// let logger = Logger::new("./logs", Level::Debug)?;
/// logger.info("Application started");
/// logger.debug(format_args!("Configuration value: {}", "some_value"));
/// logger.close()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Logger {
    close_lock: Mutex<()>,
    closed: AtomicBool,
    level: AtomicU8,
    pid: u32,
    writer: SyncWriter,
}

impl Logger {
    /// Creates `directory` (and parents) if needed and opens a writer in it
    /// with default thresholds.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CreateDirectory`] or the writer's construction error.
    pub fn new(directory: impl AsRef<Path>, level: Level) -> Result<Self> {
        Self::with_options(directory, level, Options::default())
    }

    /// Same as [`Logger::new`] with explicit writer thresholds.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CreateDirectory`] or the writer's construction error.
    pub fn with_options(
        directory: impl AsRef<Path>,
        level: Level,
        options: Options,
    ) -> Result<Self> {
        let directory = directory.as_ref();
        fs::create_dir_all(directory).map_err(|source| Error::CreateDirectory {
            path: directory.to_path_buf(),
            source,
        })?;

        let writer = SyncWriter::open_synchronized(directory, options)?;

        Ok(Self {
            close_lock: Mutex::new(()),
            closed: AtomicBool::new(false),
            level: AtomicU8::new(level as u8),
            pid: std::process::id(),
            writer,
        })
    }

    /// Current minimum level.
    pub fn level(&self) -> Level {
        Level::from_u8(self.level.load(Ordering::Relaxed))
    }

    /// Changes the minimum level.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Closed`] after [`Logger::close`].
    pub fn set_level(&self, level: Level) -> Result<()> {
        let _guard = self.close_lock.lock();
        if self.is_closed() {
            return Err(Error::Closed);
        }
        self.level.store(level as u8, Ordering::Relaxed);
        Ok(())
    }

    /// Whether a message at `level` would be written.
    pub fn is_enabled(&self, level: Level) -> bool {
        level != Level::None && !self.is_closed() && self.level() <= level
    }

    /// Whether [`Logger::close`] has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Log debug, tagged with the caller location
    #[track_caller]
    pub fn debug(&self, message: impl fmt::Display) {
        if self.is_enabled(Level::Debug) {
            let location = Location::caller();
            self.output(
                Level::Debug,
                format_args!("{}:{}: {message}", location.file(), location.line()),
            );
        }
    }

    /// Log info
    pub fn info(&self, message: impl fmt::Display) {
        if self.is_enabled(Level::Info) {
            self.output(Level::Info, message);
        }
    }

    /// Log a warning
    pub fn warn(&self, message: impl fmt::Display) {
        if self.is_enabled(Level::Warn) {
            self.output(Level::Warn, message);
        }
    }

    /// Log an error
    pub fn error(&self, message: impl fmt::Display) {
        if self.is_enabled(Level::Error) {
            self.output(Level::Error, message);
        }
    }

    /// Forces buffered lines to disk.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Closed`] after close, or the writer's flush error.
    pub fn flush(&self) -> Result<()> {
        let _guard = self.close_lock.lock();
        if self.is_closed() {
            return Err(Error::Closed);
        }
        self.writer.flush().map_err(Error::Writer)
    }

    /// Stops logging, flushes and closes the writer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Closed`] if already closed, or the writer's close
    /// error.
    pub fn close(&self) -> Result<()> {
        let _guard = self.close_lock.lock();
        if self.closed.swap(true, Ordering::AcqRel) {
            return Err(Error::Closed);
        }
        self.writer.close().map_err(Error::Writer)
    }

    fn output(&self, level: Level, message: impl fmt::Display) {
        let line = format_line(self.pid, level, &Local::now().format(DATE_TIME_FORMAT), message);

        if let Err(error) = self.writer.write_bytes(line.as_bytes()) {
            tracing::error!(%error, level = %level, "failed to write log entry");
        }
    }
}

fn format_line(
    pid: u32,
    level: Level,
    timestamp: &impl fmt::Display,
    message: impl fmt::Display,
) -> String {
    let mut line = String::with_capacity(64);
    // writing into a String cannot fail
    let _ = write!(line, "[PID:{pid}]{}: {timestamp} {message}", level.label());
    if !line.ends_with('\n') {
        line.push('\n');
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_line_appends_newline() {
        let line = format_line(7, Level::Warn, &"2025/01/02 03:04:05", "disk almost full");
        assert_eq!(line, "[PID:7]WARN: 2025/01/02 03:04:05 disk almost full\n");
    }

    #[test]
    fn test_format_line_keeps_existing_newline() {
        let line = format_line(7, Level::Info, &"t", "done\n");
        assert_eq!(line, "[PID:7]INFO: t done\n");
    }
}
