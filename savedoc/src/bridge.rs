//! Save-document bridge.
//!
//! Admits at most one save request at a time and resolves it when the picker surface reports
//! back. The system is either idle or holds exactly one pending request:
//!
//! ```text
//! Idle --submit_save (valid, launch ok)--> Pending
//! Idle --submit_save (invalid / launch fails)--> Idle
//! Pending --on_picker_result--> Idle
//! Pending --submit_save--> Pending (rejected with Busy)
//! ```
//!
//! # Example
//! ```ignore
//! let (picker, outcomes) = DirectoryPicker::new("/tmp/exports");
//! let bridge = Arc::new(SaveDocumentBridge::new(Arc::new(picker), Arc::new(FsContentStore::new())));
//! let _listener = bridge.clone().listen(outcomes);
//!
//! let handle = bridge.submit_save(SaveOptions::new("team.csv", "aGVsbG8="))?;
//! let saved = handle.wait().await?;
//! println!("Saved to {}", saved.uri);
//! ```

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::error::{Result, SaveError};
use crate::picker::DocumentPicker;
use crate::request::{DEFAULT_MIME_TYPE, Pending, PickerOutcome, SaveOptions, SaveRequest, SaveResult};
use crate::storage::ContentStore;

/// Occupant of the pending slot.
struct Slot {
    /// Distinguishes successive admissions so a failed launch only retracts its own request.
    ticket: u64,
    request: SaveRequest<Pending>,
}

#[derive(Default)]
struct SlotState {
    current: Option<Slot>,
    next_ticket: u64,
}

/// Caller's side of an admitted request.
///
/// Resolves exactly once, with the written destination or the terminal error.
#[derive(Debug)]
pub struct SaveHandle {
    rx: oneshot::Receiver<Result<SaveResult>>,
}

impl SaveHandle {
    /// Wait for the picker to report back and the write to finish.
    ///
    /// There is no timeout: if the picker never reports back, this waits until the bridge is
    /// dropped and then fails with [`SaveError::Abandoned`].
    pub async fn wait(self) -> Result<SaveResult> {
        self.rx.await.unwrap_or(Err(SaveError::Abandoned))
    }
}

/// Bridges save requests from a scripted caller to the platform picker and storage surfaces.
pub struct SaveDocumentBridge {
    picker: Arc<dyn DocumentPicker>,
    store: Arc<dyn ContentStore>,
    default_mime_type: String,
    slot: Mutex<SlotState>,
}

impl SaveDocumentBridge {
    pub fn new(picker: Arc<dyn DocumentPicker>, store: Arc<dyn ContentStore>) -> Self {
        Self {
            picker,
            store,
            default_mime_type: DEFAULT_MIME_TYPE.to_string(),
            slot: Mutex::new(SlotState::default()),
        }
    }

    /// Use `mime_type` for requests that do not name one.
    pub fn with_default_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.default_mime_type = mime_type.into();
        self
    }

    /// Whether a request currently occupies the pending slot.
    pub fn is_pending(&self) -> bool {
        self.slot.lock().current.is_some()
    }

    /// Validate and admit a save request, then launch the picker.
    ///
    /// Checks run in order and the first failure wins: busy, filename, data. Rejections leave
    /// any pending request untouched. If the picker cannot be launched the request is retracted
    /// and the bridge is idle again.
    ///
    /// # Errors
    /// - [`SaveError::Busy`] if another request is pending
    /// - [`SaveError::InvalidArgument`] if the filename is blank or the data is missing
    /// - [`SaveError::Launch`] if the picker surface failed to start
    #[tracing::instrument(skip(self, options), fields(filename = ?options.filename))]
    pub fn submit_save(&self, options: SaveOptions) -> Result<SaveHandle> {
        let (tx, rx) = oneshot::channel();

        let (ticket, hints) = {
            let mut slot = self.slot.lock();
            if slot.current.is_some() {
                tracing::info!("Rejecting save request: another save is pending");
                return Err(SaveError::Busy);
            }

            let validated = options.validate(&self.default_mime_type)?;
            let hints = validated.create_document_request();

            let ticket = slot.next_ticket;
            slot.next_ticket = slot.next_ticket.wrapping_add(1);
            slot.current = Some(Slot {
                ticket,
                request: validated.admit(tx),
            });
            (ticket, hints)
        };

        tracing::info!(
            mime_type = %hints.mime_type,
            "Save request admitted, launching picker"
        );

        // The slot lock is released so a picker that reports back quickly cannot deadlock
        if let Err(source) = self.picker.launch(&hints) {
            tracing::warn!(error = %source, "Picker launch failed, retracting save request");
            self.retract(ticket);
            return Err(SaveError::Launch { source: source.into() });
        }

        Ok(SaveHandle { rx })
    }

    /// Deliver the picker's completion signal.
    ///
    /// The pending request is taken out of the slot before any other work, so the bridge is idle
    /// again whatever the outcome. With nothing pending the signal is ignored. The write runs
    /// synchronously on the calling thread.
    pub fn on_picker_result(&self, outcome: PickerOutcome) {
        let taken = self.slot.lock().current.take();

        let Some(Slot { request, .. }) = taken else {
            tracing::debug!(status = ?outcome.status, "Ignoring picker result with no pending save");
            return;
        };

        request.complete(outcome, self.store.as_ref());
    }

    /// Forward every completion signal from `outcomes` into [`on_picker_result`](Self::on_picker_result).
    ///
    /// Writes run on the blocking pool. The task ends when every sender is dropped.
    pub fn listen(self: Arc<Self>, mut outcomes: mpsc::UnboundedReceiver<PickerOutcome>) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(outcome) = outcomes.recv().await {
                let bridge = self.clone();
                if let Err(e) = tokio::task::spawn_blocking(move || bridge.on_picker_result(outcome)).await {
                    tracing::error!(error = %e, "Picker result handler panicked");
                }
            }
            tracing::debug!("Picker result channel closed");
        })
    }

    fn retract(&self, ticket: u64) {
        let mut slot = self.slot.lock();
        if slot.current.as_ref().is_some_and(|current| current.ticket == ticket) {
            slot.current = None;
        }
    }
}
