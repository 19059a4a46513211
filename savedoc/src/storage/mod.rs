//! Content/storage surface.
//!
//! Resolves a destination reference chosen in the picker to a byte sink. Implementations can be
//! backed by the local filesystem or kept in memory for tests.

use std::io::{self, Write};

use crate::request::DestinationRef;

pub mod fs;
pub mod in_memory;

/// A writable, truncated byte sink for one destination.
///
/// Dropping a sink releases it; [`ByteSink::close`] additionally reports errors that occur while
/// releasing it.
pub trait ByteSink: Write + Send {
    /// Flush remaining bytes and release the sink.
    fn close(self: Box<Self>) -> io::Result<()>;
}

/// Storage trait that opens write sinks for destination references.
pub trait ContentStore: Send + Sync {
    /// Open `destination` for writing, truncating any existing content.
    ///
    /// Returns `Ok(None)` when the destination is not something this store can write to.
    ///
    /// # Errors
    /// Returns an I/O error if the destination is known but cannot be opened.
    fn open_write_sink(&self, destination: &DestinationRef) -> io::Result<Option<Box<dyn ByteSink>>>;
}
