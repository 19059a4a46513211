//! Picker surface abstraction.
//!
//! This module defines the `DocumentPicker` trait for launching the platform's "create document"
//! flow. The completion signal is delivered separately, through
//! [`SaveDocumentBridge::on_picker_result`](crate::bridge::SaveDocumentBridge::on_picker_result).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, anyhow};
use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::request::{CreateDocumentRequest, DestinationRef, PickerOutcome};
use crate::storage::fs::file_uri;

/// Trait for launching the destination picker.
///
/// `launch` only starts the flow. The bridge holds no lock while `launch` runs, so an
/// implementation may queue or even deliver the completion signal before `launch` returns. At
/// most one signal is expected per successful launch.
pub trait DocumentPicker: Send + Sync {
    /// Start a "create document" flow with the given hints.
    ///
    /// # Errors
    /// Returns an error if no picker can be shown.
    fn launch(&self, request: &CreateDocumentRequest) -> anyhow::Result<()>;
}

// ============================================================================
// Directory picker
// ============================================================================

/// Picker surface that always chooses `<root>/<suggested name>`.
///
/// Used by the command-line host, where there is no interactive dialog. Completion signals are
/// sent over an unbounded channel; feed the receiver to
/// [`SaveDocumentBridge::listen`](crate::bridge::SaveDocumentBridge::listen).
#[derive(Debug, Clone)]
pub struct DirectoryPicker {
    root: PathBuf,
    outcomes: mpsc::UnboundedSender<PickerOutcome>,
}

impl DirectoryPicker {
    pub fn new(root: impl Into<PathBuf>) -> (Self, mpsc::UnboundedReceiver<PickerOutcome>) {
        let (outcomes, rx) = mpsc::unbounded_channel();
        (
            Self {
                root: root.into(),
                outcomes,
            },
            rx,
        )
    }
}

impl DocumentPicker for DirectoryPicker {
    #[tracing::instrument(skip(self, request), fields(suggested_name = %request.suggested_name))]
    fn launch(&self, request: &CreateDocumentRequest) -> anyhow::Result<()> {
        if !self.root.is_dir() {
            return Err(anyhow!("output directory {} does not exist", self.root.display()));
        }

        let destination = directory_destination(&self.root, request);
        tracing::debug!(destination = %destination, "Directory picker selected destination");

        self.outcomes
            .send(PickerOutcome::selected(destination))
            .context("picker result channel closed")?;
        Ok(())
    }
}

/// Destination the directory picker chooses for `request` under `root`.
pub fn directory_destination(root: &Path, request: &CreateDocumentRequest) -> DestinationRef {
    file_uri(&root.join(sanitize_filename(&request.suggested_name)))
}

/// Reduce a suggested name to a single path segment.
pub fn sanitize_filename(name: &str) -> String {
    let normalized = name.replace('\\', "/");
    let segment = normalized
        .split('/')
        .filter(|segment| !segment.trim().is_empty())
        .next_back()
        .unwrap_or_default()
        .trim();
    match segment {
        "" | "." | ".." => "document".to_string(),
        segment => segment.to_string(),
    }
}

// ============================================================================
// Unavailable picker
// ============================================================================

/// Picker for hosts without any picker surface. Every launch fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailablePicker;

impl DocumentPicker for UnavailablePicker {
    fn launch(&self, _request: &CreateDocumentRequest) -> anyhow::Result<()> {
        Err(anyhow!("document picker is not available on this platform"))
    }
}

// ============================================================================
// Test/Mock Implementation
// ============================================================================

/// Mock picker for testing.
///
/// Records every launch. Completion signals are not sent automatically; tests deliver them by
/// calling `on_picker_result` on the bridge.
#[derive(Clone, Default)]
pub struct MockDocumentPicker {
    launches: Arc<Mutex<Vec<CreateDocumentRequest>>>,
    failure: Arc<Mutex<Option<String>>>,
}

impl MockDocumentPicker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent launches fail with `message`.
    pub fn fail_launches(&self, message: impl Into<String>) {
        *self.failure.lock() = Some(message.into());
    }

    /// Let subsequent launches succeed again.
    pub fn succeed_launches(&self) {
        *self.failure.lock() = None;
    }

    /// Get all launches made through this picker, failed ones included.
    pub fn launches(&self) -> Vec<CreateDocumentRequest> {
        self.launches.lock().clone()
    }

    pub fn launch_count(&self) -> usize {
        self.launches.lock().len()
    }
}

impl DocumentPicker for MockDocumentPicker {
    fn launch(&self, request: &CreateDocumentRequest) -> anyhow::Result<()> {
        self.launches.lock().push(request.clone());

        match self.failure.lock().as_ref() {
            Some(message) => Err(anyhow!("{message}")),
            None => Ok(()),
        }
    }
}
