//! Synchronization strategies selected when a writer is constructed

use crate::engine::Engine;

use std::cell::RefCell;

use parking_lot::Mutex;

mod sealed {
    pub trait Sealed {}
}

/// How a [`Writer`](crate::Writer) serializes access to its state.
///
/// Both strategies expose the same operations; they differ only in whether
/// the compiler lets the writer be shared between threads.
pub trait Strategy: sealed::Sealed {
    #[doc(hidden)]
    fn new(engine: Engine) -> Self;

    #[doc(hidden)]
    fn with<R>(&self, f: impl FnOnce(&mut Engine) -> R) -> R;
}

/// No locking. The writer is `Send` but not `Sync`, so it can be moved to
/// another thread but never used from two at once.
#[derive(Debug)]
pub struct Unsynchronized(RefCell<Engine>);

impl sealed::Sealed for Unsynchronized {}

impl Strategy for Unsynchronized {
    fn new(engine: Engine) -> Self {
        Self(RefCell::new(engine))
    }

    fn with<R>(&self, f: impl FnOnce(&mut Engine) -> R) -> R {
        f(&mut self.0.borrow_mut())
    }
}

/// A single mutex held for the whole of every operation.
#[derive(Debug)]
pub struct Synchronized(Mutex<Engine>);

impl sealed::Sealed for Synchronized {}

impl Strategy for Synchronized {
    fn new(engine: Engine) -> Self {
        Self(Mutex::new(engine))
    }

    fn with<R>(&self, f: impl FnOnce(&mut Engine) -> R) -> R {
        f(&mut self.0.lock())
    }
}
