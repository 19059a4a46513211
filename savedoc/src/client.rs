//! Caller-side helper for saving raw bytes through the bridge.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use crate::bridge::SaveDocumentBridge;
use crate::error::Result;
use crate::request::{SaveOptions, SaveResult};

/// Encode `bytes`, submit them and wait for the picker flow to finish.
///
/// Rejections from the gate are returned without waiting.
pub async fn save_document_with_dialog(
    bridge: &SaveDocumentBridge,
    filename: &str,
    bytes: &[u8],
    mime_type: Option<&str>,
) -> Result<SaveResult> {
    let mut options = SaveOptions::new(filename, STANDARD.encode(bytes));
    if let Some(mime_type) = mime_type {
        options = options.with_mime_type(mime_type);
    }

    tracing::debug!(filename, bytes = bytes.len(), "Submitting document");
    bridge.submit_save(options)?.wait().await
}
