//! Core types for a save request.
//!
//! A request moves through its lifecycle using the typestate pattern: options from the caller
//! are validated into a `SaveRequest<Validated>`, admitted into the pending slot as a
//! `SaveRequest<Pending>`, and consumed exactly once when the picker reports back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::error::Result;

/// MIME type used when the caller does not supply one.
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// Marker trait for valid request states.
pub trait SaveState: Send {}

/// A save request in state `T`.
#[derive(Debug)]
pub struct SaveRequest<T: SaveState> {
    /// The current state of the request.
    pub state: T,
    /// The caller-supplied document.
    pub data: SaveData,
}

/// Raw request object from the scripted caller.
///
/// Every field is optional on the wire so that missing values reach the gate and are
/// rejected with a descriptive error rather than a deserialization failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveOptions {
    pub filename: Option<String>,
    /// Base64 payload; an empty string is a zero-byte document.
    pub data: Option<String>,
    pub mime_type: Option<String>,
}

impl SaveOptions {
    pub fn new(filename: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            filename: Some(filename.into()),
            data: Some(data.into()),
            mime_type: None,
        }
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }
}

/// Document data captured at submission time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveData {
    /// Suggested filename, as supplied (only checked for blankness).
    pub filename: String,
    /// Base64 payload, not yet decoded.
    pub payload: String,
    pub mime_type: String,
}

/// Request that passed validation but has not been admitted.
#[derive(Debug)]
pub struct Validated {}

impl SaveState for Validated {}

/// Request that occupies the pending slot while the picker is open.
#[derive(Debug)]
pub struct Pending {
    pub submitted_at: DateTime<Utc>,
    /// Delivers the single resolution or rejection to the caller.
    pub responder: oneshot::Sender<Result<SaveResult>>,
}

impl SaveState for Pending {}

/// Hints handed to the picker surface when asking for a new document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDocumentRequest {
    pub suggested_name: String,
    pub mime_type: String,
}

/// Opaque identifier of the write target chosen in the picker.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DestinationRef(String);

impl DestinationRef {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DestinationRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DestinationRef {
    fn from(reference: &str) -> Self {
        Self::new(reference)
    }
}

/// Status code reported by the picker surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PickerStatus {
    Ok,
    Cancelled,
}

/// Result data attached to a completed picker flow.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickerResultData {
    pub destination: Option<DestinationRef>,
}

/// Completion signal delivered by the picker surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickerOutcome {
    pub status: PickerStatus,
    pub data: Option<PickerResultData>,
}

impl PickerOutcome {
    /// The user picked `destination`.
    pub fn selected(destination: impl Into<DestinationRef>) -> Self {
        Self {
            status: PickerStatus::Ok,
            data: Some(PickerResultData {
                destination: Some(destination.into()),
            }),
        }
    }

    /// The user dismissed the picker.
    pub fn cancelled() -> Self {
        Self {
            status: PickerStatus::Cancelled,
            data: None,
        }
    }

    /// The picker completed but carried no destination.
    pub fn without_destination() -> Self {
        Self {
            status: PickerStatus::Ok,
            data: Some(PickerResultData::default()),
        }
    }
}

/// Response delivered to the caller once the document is written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveResult {
    pub uri: String,
    pub mime_type: String,
}
