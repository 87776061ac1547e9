//! Diagnostics raised by the engine and emitted once its lock is released

use crate::{Error, Options};

use std::cell::Cell;
use std::path::PathBuf;

use tracing::{debug, trace, warn};

#[derive(Debug)]
pub enum Event {
    Flushed { bytes: usize },
    Rotated { archive: PathBuf },
    Latched { path: PathBuf, error: Error, pending: usize },
    Reconfigured { options: Options },
    Closed { path: PathBuf },
}

impl Event {
    fn emit(&self) {
        match self {
            Self::Flushed { bytes } => trace!(bytes, "flushed log buffer"),
            Self::Rotated { archive } => {
                debug!(archive = %archive.display(), "rotated active log file");
            }
            Self::Latched {
                path,
                error,
                pending,
            } => warn!(
                path = %path.display(),
                %error,
                pending,
                "log writer failed, refusing further writes"
            ),
            Self::Reconfigured { options } => debug!(?options, "reconfigured log writer"),
            Self::Closed { path } => debug!(path = %path.display(), "closed log writer"),
        }
    }
}

thread_local! {
    static EMITTING: Cell<bool> = const { Cell::new(false) };
}

struct EmittingGuard;

impl Drop for EmittingGuard {
    fn drop(&mut self) {
        EMITTING.with(|emitting| emitting.set(false));
    }
}

/// Emits `events` through `tracing`.
///
/// A subscriber may route its output back into the writer, which can raise
/// further events on this thread. Those are discarded rather than emitted,
/// so diagnostics never feed on themselves.
pub fn emit_all(events: Vec<Event>) {
    if events.is_empty() || EMITTING.with(|emitting| emitting.replace(true)) {
        return;
    }
    let _guard = EmittingGuard;

    for event in &events {
        event.emit();
    }
}
