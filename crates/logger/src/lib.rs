//! Leveled text logger backed by the `rlog` rotating writer.
//!
//! Formatting and level filtering live here; buffering, durability and
//! rotation are delegated to [`rlog::SyncWriter`].
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

mod error;
mod level;
mod logger;

pub use error::{Error, Result};
pub use level::Level;
pub use logger::Logger;
