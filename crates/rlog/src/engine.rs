//! Buffer, flush and rotation state shared by both synchronization strategies

use crate::buffer::Buffer;
use crate::event::Event;
use crate::{Error, Options, Result};

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::{DateTime, Utc};

/// Name of the file that always receives new bytes.
pub const ACTIVE_FILE_NAME: &str = "latest.log";

/// Archive names carry the rotation instant down to the microsecond.
const ARCHIVE_TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S%.6f";

/// Lifecycle of a writer. Transitions only move forward.
#[derive(Debug)]
enum State {
    Open,
    Errored(Error),
    Closed,
}

#[derive(Debug)]
pub struct Engine {
    directory: PathBuf,
    active_path: PathBuf,
    options: Options,
    buffer: Buffer,
    last_flush: Instant,
    file: Option<File>,
    state: State,
    events: Vec<Event>,
}

fn check_directory(directory: &Path) -> Result<()> {
    match fs::metadata(directory) {
        Ok(metadata) if metadata.is_dir() => Ok(()),
        Ok(_) => Err(Error::NotADirectory(directory.to_path_buf())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            Err(Error::DirectoryNotFound(directory.to_path_buf()))
        }
        Err(e) => Err(Error::io("failed to inspect log directory", e)),
    }
}

fn active_file<'a>(file: &'a mut Option<File>, path: &Path) -> Result<&'a mut File> {
    file.as_mut().ok_or_else(|| Error::Closed(path.to_path_buf()))
}

/// Syncs a handle before letting it go; `File` has no fallible close.
fn release(file: File) -> Result<()> {
    file.sync_all()
        .map_err(|e| Error::io("failed to close active log file", e))
}

fn open_active(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| Error::io("failed to open active log file", e))
}

/// Builds `<directory>/<YYYYMMDD-HHMMSS.ffffff>.log` for a rotation instant.
pub fn archive_path(directory: &Path, instant: DateTime<Utc>) -> PathBuf {
    directory.join(format!("{}.log", instant.format(ARCHIVE_TIMESTAMP_FORMAT)))
}

impl Engine {
    pub fn open(directory: &Path, options: Options) -> Result<Self> {
        options.validate()?;
        check_directory(directory)?;

        let active_path = directory.join(ACTIVE_FILE_NAME);
        let file = open_active(&active_path)?;

        Ok(Self {
            directory: directory.to_path_buf(),
            active_path,
            options,
            buffer: Buffer::with_capacity(options.max_buffer_size),
            last_flush: Instant::now(),
            file: Some(file),
            state: State::Open,
            events: Vec::new(),
        })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn active_path(&self) -> &Path {
        &self.active_path
    }

    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Diagnostics raised since the last call, for emission outside the lock.
    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    /// Accepts `bytes` into the buffer and flushes if either threshold is met.
    pub fn write(&mut self, bytes: &[u8]) -> Result<usize> {
        self.ensure_open()?;

        self.buffer.extend(bytes);
        if self.buffer.len() >= self.options.max_buffer_size
            || self.last_flush.elapsed() >= self.options.max_buffer_age
        {
            self.flush_buffer().map_err(|e| self.latch(e))?;
        }

        Ok(bytes.len())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.flush_buffer().map_err(|e| self.latch(e))
    }

    /// Final flush, then release the handle whatever the flush returned.
    /// The flush error takes precedence over the close error.
    pub fn close(&mut self) -> Result<()> {
        if matches!(self.state, State::Closed) {
            return Err(Error::Closed(self.active_path.clone()));
        }

        let flushed = self.flush();
        let released = self.file.take().map_or(Ok(()), release);
        self.state = State::Closed;

        self.events.push(Event::Closed {
            path: self.active_path.clone(),
        });

        flushed.and(released)
    }

    pub fn reconfigure(&mut self, options: Options) -> Result<()> {
        self.ensure_open()?;
        options.validate()?;

        self.buffer.ensure_capacity(options.max_buffer_size);
        self.options = options;

        self.events.push(Event::Reconfigured { options });
        Ok(())
    }

    /// Last chance for pending bytes when the owner never called `close`.
    pub fn flush_before_drop(&mut self) {
        if matches!(self.state, State::Open) && !self.buffer.is_empty() {
            // a failure has already been reported by `latch`
            let _ = self.flush();
        }
    }

    fn ensure_open(&self) -> Result<()> {
        match &self.state {
            State::Open => Ok(()),
            State::Errored(error) => Err(error.clone()),
            State::Closed => Err(Error::Closed(self.active_path.clone())),
        }
    }

    /// Records the first failure and drops the active handle. Nothing is
    /// written after this point.
    fn latch(&mut self, error: Error) -> Error {
        self.events.push(Event::Latched {
            path: self.active_path.clone(),
            error: error.clone(),
            pending: self.buffer.len(),
        });

        self.file = None;
        self.state = State::Errored(error.clone());
        error
    }

    /// Rotation happens strictly before the pending bytes are written, so the
    /// buffer always lands in the fresh file.
    fn flush_buffer(&mut self) -> Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }

        let current_size = active_file(&mut self.file, &self.active_path)?
            .metadata()
            .map_err(|e| Error::io("failed to stat active log file", e))?
            .len();
        let pending = u64::try_from(self.buffer.len()).unwrap_or(u64::MAX);
        if current_size.saturating_add(pending) >= self.options.max_file_size {
            self.rotate()?;
        }

        let file = active_file(&mut self.file, &self.active_path)?;
        file.write_all(self.buffer.as_slice())
            .map_err(|e| Error::io("failed to write active log file", e))?;
        file.sync_all()
            .map_err(|e| Error::io("failed to sync active log file", e))?;

        self.events.push(Event::Flushed {
            bytes: self.buffer.len(),
        });

        self.buffer.clear();
        self.last_flush = Instant::now();
        Ok(())
    }

    fn rotate(&mut self) -> Result<()> {
        self.rotate_at(Utc::now())
    }

    fn rotate_at(&mut self, instant: DateTime<Utc>) -> Result<()> {
        if let Some(file) = self.file.take() {
            release(file)?;
        }

        let archive = archive_path(&self.directory, instant);
        let taken = archive
            .try_exists()
            .map_err(|e| Error::io("failed to check archive log file", e))?;
        if taken {
            return Err(Error::io(
                "failed to rename active log file",
                io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    format!("archive {} already exists", archive.display()),
                ),
            ));
        }

        fs::rename(&self.active_path, &archive)
            .map_err(|e| Error::io("failed to rename active log file", e))?;
        self.file = Some(open_active(&self.active_path)?);

        self.events.push(Event::Rotated { archive });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use assert_matches::assert_matches;
    use chrono::TimeZone;
    use tempfile::tempdir;

    #[test]
    fn test_archive_path_format() {
        let instant = Utc
            .with_ymd_and_hms(2025, 3, 7, 9, 5, 1)
            .unwrap()
            .checked_add_signed(chrono::TimeDelta::microseconds(42))
            .unwrap();

        let path = archive_path(Path::new("logs"), instant);

        assert_eq!(path, Path::new("logs").join("20250307-090501.000042.log"));
    }

    #[test]
    fn test_archive_names_sort_chronologically() {
        let earlier = Utc.with_ymd_and_hms(2025, 12, 31, 23, 59, 59).unwrap();
        let later = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();

        assert!(archive_path(Path::new("d"), earlier) < archive_path(Path::new("d"), later));
    }

    #[test]
    fn test_rotation_refuses_existing_archive() {
        let dir = tempdir().unwrap();
        let mut engine = Engine::open(dir.path(), Options::default()).unwrap();
        engine.write(b"kept").unwrap();
        engine.flush().unwrap();

        let instant = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        fs::write(archive_path(dir.path(), instant), b"older archive").unwrap();

        let result = engine.rotate_at(instant);

        assert_matches!(result, Err(Error::Io(_, source)) if source.kind() == io::ErrorKind::AlreadyExists);
        assert_eq!(
            fs::read(archive_path(dir.path(), instant)).unwrap(),
            b"older archive"
        );
        assert_eq!(fs::read(dir.path().join(ACTIVE_FILE_NAME)).unwrap(), b"kept");
    }

    #[test]
    fn test_latched_error_is_returned_verbatim() {
        let dir = tempdir().unwrap();
        let mut engine = Engine::open(
            dir.path(),
            Options::default().with_max_file_size(4).with_max_buffer_size(100),
        )
        .unwrap();

        engine.write(b"abcd").unwrap();
        fs::remove_file(dir.path().join(ACTIVE_FILE_NAME)).unwrap();

        let first = engine.flush().unwrap_err();
        let second = engine.write(b"more").unwrap_err();

        match (first, second) {
            (Error::Io(ctx_a, a), Error::Io(ctx_b, b)) => {
                assert_eq!(ctx_a, ctx_b);
                assert!(std::sync::Arc::ptr_eq(&a, &b));
            }
            other => panic!("unexpected errors: {other:?}"),
        }
        assert!(engine.file.is_none());
        assert_eq!(engine.buffered_len(), 4);
        assert_matches!(engine.take_events().as_slice(), [Event::Latched { pending: 4, .. }]);
        assert!(engine.take_events().is_empty());
    }

    #[test]
    fn test_rotation_syncs_and_replaces_handle() {
        let dir = tempdir().unwrap();
        let mut engine = Engine::open(dir.path(), Options::default()).unwrap();
        engine.write(b"before").unwrap();
        engine.flush().unwrap();
        engine.take_events();

        let instant = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        engine.rotate_at(instant).unwrap();
        engine.write(b"after").unwrap();
        engine.flush().unwrap();

        assert_eq!(fs::read(archive_path(dir.path(), instant)).unwrap(), b"before");
        assert_eq!(fs::read(dir.path().join(ACTIVE_FILE_NAME)).unwrap(), b"after");
        assert_matches!(
            engine.take_events().as_slice(),
            [Event::Rotated { archive }, Event::Flushed { bytes: 5 }]
                if *archive == archive_path(dir.path(), instant)
        );
    }

    #[test]
    fn test_unbounded_buffer_threshold() {
        let dir = tempdir().unwrap();
        let mut engine =
            Engine::open(dir.path(), Options::default().with_max_buffer_size(usize::MAX)).unwrap();

        engine.write(b"age or explicit flush only").unwrap();
        engine
            .reconfigure(Options::default().with_max_buffer_size(usize::MAX))
            .unwrap();

        assert_eq!(engine.buffered_len(), 26);
        engine.flush().unwrap();
        assert_eq!(
            fs::read(dir.path().join(ACTIVE_FILE_NAME)).unwrap(),
            b"age or explicit flush only"
        );
    }

    #[test]
    fn test_reconfigure_grows_buffer_capacity() {
        let dir = tempdir().unwrap();
        let mut engine =
            Engine::open(dir.path(), Options::default().with_max_buffer_size(8)).unwrap();

        engine.write(b"abc").unwrap();
        engine
            .reconfigure(Options::default().with_max_buffer_size(1 << 16))
            .unwrap();

        assert!(engine.buffer.capacity() >= 1 << 16);
        assert_eq!(engine.buffer.as_slice(), b"abc");
    }
}
