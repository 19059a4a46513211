//! In-memory content store.
//!
//! Keeps written documents in a map keyed by destination. It's suitable for testing and for
//! hosts that hand the bytes on themselves. Contents are lost on drop.

use std::collections::{HashMap, HashSet};
use std::io::{self, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::RwLock;

use crate::request::DestinationRef;

use super::{ByteSink, ContentStore};

#[derive(Default)]
struct Inner {
    documents: RwLock<HashMap<DestinationRef, Vec<u8>>>,
    refused: RwLock<HashSet<DestinationRef>>,
    failing: RwLock<HashSet<DestinationRef>>,
    open_errors: RwLock<HashMap<DestinationRef, String>>,
    failing_closes: RwLock<HashSet<DestinationRef>>,
    opened: AtomicUsize,
    released: AtomicUsize,
}

/// In-memory implementation of the [`ContentStore`] trait.
///
/// Any destination is writable unless it was marked with [`refuse`](Self::refuse) (no sink),
/// [`fail_opens`](Self::fail_opens) (open errors), [`fail_writes`](Self::fail_writes) (sink whose
/// writes error) or [`fail_closes`](Self::fail_closes) (sink whose close errors). A document
/// becomes visible once its sink is closed.
#[derive(Clone, Default)]
pub struct InMemoryContentStore {
    inner: Arc<Inner>,
}

impl InMemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `destination` yield no sink.
    pub fn refuse(&self, destination: impl Into<DestinationRef>) {
        self.inner.refused.write().insert(destination.into());
    }

    /// Make every write to `destination` fail.
    pub fn fail_writes(&self, destination: impl Into<DestinationRef>) {
        self.inner.failing.write().insert(destination.into());
    }

    /// Make opening `destination` fail with an I/O error carrying `message`.
    pub fn fail_opens(&self, destination: impl Into<DestinationRef>, message: impl Into<String>) {
        self.inner.open_errors.write().insert(destination.into(), message.into());
    }

    /// Make closing a sink for `destination` fail. Nothing is committed.
    pub fn fail_closes(&self, destination: impl Into<DestinationRef>) {
        self.inner.failing_closes.write().insert(destination.into());
    }

    /// Committed contents of `destination`.
    pub fn contents(&self, destination: &DestinationRef) -> Option<Vec<u8>> {
        self.inner.documents.read().get(destination).cloned()
    }

    /// Number of sinks handed out.
    pub fn open_count(&self) -> usize {
        self.inner.opened.load(Ordering::SeqCst)
    }

    /// Number of sinks released, whether closed explicitly or dropped.
    pub fn release_count(&self) -> usize {
        self.inner.released.load(Ordering::SeqCst)
    }
}

impl ContentStore for InMemoryContentStore {
    fn open_write_sink(&self, destination: &DestinationRef) -> io::Result<Option<Box<dyn ByteSink>>> {
        if self.inner.refused.read().contains(destination) {
            return Ok(None);
        }
        if let Some(message) = self.inner.open_errors.read().get(destination) {
            return Err(io::Error::other(message.clone()));
        }

        self.inner.opened.fetch_add(1, Ordering::SeqCst);
        // Truncate on open
        self.inner.documents.write().insert(destination.clone(), Vec::new());

        Ok(Some(Box::new(MemorySink {
            destination: destination.clone(),
            buffer: Vec::new(),
            fail: self.inner.failing.read().contains(destination),
            fail_close: self.inner.failing_closes.read().contains(destination),
            inner: self.inner.clone(),
        })))
    }
}

struct MemorySink {
    destination: DestinationRef,
    buffer: Vec<u8>,
    fail: bool,
    fail_close: bool,
    inner: Arc<Inner>,
}

impl Write for MemorySink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.fail {
            return Err(io::Error::other(format!("write to {} rejected", self.destination)));
        }
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl ByteSink for MemorySink {
    fn close(mut self: Box<Self>) -> io::Result<()> {
        if self.fail_close {
            return Err(io::Error::other("sync failed"));
        }
        let buffer = std::mem::take(&mut self.buffer);
        self.inner.documents.write().insert(self.destination.clone(), buffer);
        Ok(())
    }
}

impl Drop for MemorySink {
    fn drop(&mut self) {
        self.inner.released.fetch_add(1, Ordering::SeqCst);
    }
}
