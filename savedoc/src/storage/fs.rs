//! Filesystem-backed content store.

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::request::DestinationRef;

use super::{ByteSink, ContentStore};

/// Writes documents to local files.
///
/// Destination references are plain paths or `file://` URIs. References with any other scheme
/// (for example `content://`) are not handled by this store.
#[derive(Debug, Clone, Default)]
pub struct FsContentStore;

impl FsContentStore {
    pub fn new() -> Self {
        Self
    }

    fn resolve(destination: &DestinationRef) -> Option<PathBuf> {
        let reference = destination.as_str();
        if let Some(path) = reference.strip_prefix("file://") {
            return Some(PathBuf::from(path));
        }
        if reference.is_empty() || reference.contains("://") {
            return None;
        }
        Some(PathBuf::from(reference))
    }
}

impl ContentStore for FsContentStore {
    fn open_write_sink(&self, destination: &DestinationRef) -> io::Result<Option<Box<dyn ByteSink>>> {
        let Some(path) = Self::resolve(destination) else {
            tracing::debug!(destination = %destination, "Destination is not a filesystem path");
            return Ok(None);
        };

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)?;

        Ok(Some(Box::new(FileSink {
            writer: BufWriter::new(file),
        })))
    }
}

/// Build a `file://` reference for `path`.
pub fn file_uri(path: &Path) -> DestinationRef {
    DestinationRef::new(format!("file://{}", path.display()))
}

struct FileSink {
    writer: BufWriter<File>,
}

impl Write for FileSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

impl ByteSink for FileSink {
    fn close(self: Box<Self>) -> io::Result<()> {
        let file = self.writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()
    }
}
