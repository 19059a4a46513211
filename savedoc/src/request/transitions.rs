use std::borrow::Cow;
use std::io::Write;

use base64::Engine as _;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use chrono::Utc;
use tokio::sync::oneshot;

use crate::error::{Result, SaveError};
use crate::storage::ContentStore;

use super::types::{
    CreateDocumentRequest, Pending, PickerOutcome, PickerStatus, SaveData, SaveOptions, SaveRequest, SaveResult,
    Validated,
};

/// Standard alphabet, padding optional, non-zero trailing bits accepted.
const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

impl SaveOptions {
    /// Check the caller's fields, filename first.
    ///
    /// Only an absent `mime_type` resolves to `default_mime_type`; any supplied value, even an
    /// empty one, is kept as is.
    pub fn validate(self, default_mime_type: &str) -> Result<SaveRequest<Validated>> {
        let filename = match self.filename {
            Some(filename) if !filename.trim().is_empty() => filename,
            _ => return Err(SaveError::invalid_argument("filename must be provided.")),
        };

        let Some(payload) = self.data else {
            return Err(SaveError::invalid_argument("data must be provided."));
        };

        let mime_type = self.mime_type.unwrap_or_else(|| default_mime_type.to_string());

        Ok(SaveRequest {
            state: Validated {},
            data: SaveData {
                filename,
                payload,
                mime_type,
            },
        })
    }
}

impl SaveRequest<Validated> {
    /// Hints for the picker surface.
    pub fn create_document_request(&self) -> CreateDocumentRequest {
        CreateDocumentRequest {
            suggested_name: self.data.filename.clone(),
            mime_type: self.data.mime_type.clone(),
        }
    }

    pub fn admit(self, responder: oneshot::Sender<Result<SaveResult>>) -> SaveRequest<Pending> {
        SaveRequest {
            data: self.data,
            state: Pending {
                submitted_at: Utc::now(),
                responder,
            },
        }
    }
}

impl SaveRequest<Pending> {
    /// Resolve this request from the picker's completion signal.
    ///
    /// Performs the write (if any) and delivers the outcome to the requester. Returns `false`
    /// when the requester had already gone away and nobody received the outcome.
    pub fn complete<S: ContentStore + ?Sized>(self, outcome: PickerOutcome, store: &S) -> bool {
        let SaveRequest { state, data } = self;
        let waited_ms = (Utc::now() - state.submitted_at).num_milliseconds();
        let filename = data.filename.clone();

        let result = data.write(outcome, store);

        match &result {
            Ok(saved) => tracing::info!(
                filename = %filename,
                uri = %saved.uri,
                mime_type = %saved.mime_type,
                waited_ms,
                "Document saved"
            ),
            Err(e) => tracing::warn!(
                filename = %filename,
                code = e.code(),
                error = %e,
                waited_ms,
                "Save request failed"
            ),
        }

        let delivered = state.responder.send(result).is_ok();
        if !delivered {
            tracing::debug!(filename = %filename, "Requester dropped before the save resolved");
        }
        delivered
    }
}

impl SaveData {
    fn write<S: ContentStore + ?Sized>(self, outcome: PickerOutcome, store: &S) -> Result<SaveResult> {
        if outcome.status != PickerStatus::Ok {
            return Err(SaveError::UserCancelled);
        }
        let Some(result_data) = outcome.data else {
            return Err(SaveError::UserCancelled);
        };
        let Some(destination) = result_data.destination else {
            return Err(SaveError::NoDestination);
        };

        let bytes = decode_payload(&self.payload)?;

        let mut sink = store
            .open_write_sink(&destination)
            .map_err(|source| SaveError::DestinationUnavailable { source: Some(source) })?
            .ok_or(SaveError::DestinationUnavailable { source: None })?;

        // An early return drops the sink, which releases it
        sink.write_all(&bytes)
            .and_then(|()| sink.flush())
            .map_err(|source| SaveError::Write { source })?;
        sink.close().map_err(|source| SaveError::Write { source })?;

        tracing::debug!(destination = %destination, bytes = bytes.len(), "Payload written");

        Ok(SaveResult {
            uri: destination.to_string(),
            mime_type: self.mime_type,
        })
    }
}

/// Decode a caller payload. ASCII whitespace is ignored.
pub fn decode_payload(payload: &str) -> Result<Vec<u8>> {
    let compact: Cow<'_, str> = if payload.bytes().any(|b| b.is_ascii_whitespace()) {
        Cow::Owned(payload.chars().filter(|c| !c.is_ascii_whitespace()).collect())
    } else {
        Cow::Borrowed(payload)
    };
    Ok(PAYLOAD_ENGINE.decode(compact.as_bytes())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::types::DEFAULT_MIME_TYPE;
    use crate::storage::in_memory::InMemoryContentStore;

    fn pending(payload: &str) -> (SaveRequest<Pending>, oneshot::Receiver<Result<SaveResult>>) {
        let (tx, rx) = oneshot::channel();
        let request = SaveOptions::new("deck.txt", payload)
            .with_mime_type("text/plain")
            .validate(DEFAULT_MIME_TYPE)
            .unwrap()
            .admit(tx);
        (request, rx)
    }

    #[test]
    fn test_validate_rejects_blank_filename() {
        for filename in ["", "   ", "\t\n"] {
            let err = SaveOptions::new(filename, "aGk=").validate(DEFAULT_MIME_TYPE).unwrap_err();
            assert!(matches!(err, SaveError::InvalidArgument { .. }));
            assert_eq!(err.to_string(), "filename must be provided.");
        }
    }

    #[test]
    fn test_validate_checks_filename_before_data() {
        let err = SaveOptions::default().validate(DEFAULT_MIME_TYPE).unwrap_err();
        assert_eq!(err.to_string(), "filename must be provided.");
    }

    #[test]
    fn test_validate_rejects_missing_data_but_admits_empty() {
        let options = SaveOptions {
            filename: Some("empty.bin".to_string()),
            data: None,
            mime_type: None,
        };
        let err = options.validate(DEFAULT_MIME_TYPE).unwrap_err();
        assert_eq!(err.to_string(), "data must be provided.");

        let request = SaveOptions::new("empty.bin", "").validate(DEFAULT_MIME_TYPE).unwrap();
        assert_eq!(request.data.payload, "");
    }

    #[test]
    fn test_validate_resolves_default_mime_type() {
        let request = SaveOptions::new("a.bin", "").validate(DEFAULT_MIME_TYPE).unwrap();
        assert_eq!(request.data.mime_type, DEFAULT_MIME_TYPE);

        let request = SaveOptions::new("a.bin", "").validate("application/zip").unwrap();
        assert_eq!(request.data.mime_type, "application/zip");

        for supplied in ["", "  "] {
            let request = SaveOptions::new("a.bin", "")
                .with_mime_type(supplied)
                .validate("application/zip")
                .unwrap();
            assert_eq!(request.data.mime_type, supplied);
        }

        let hints = SaveOptions::new(" report.pdf", "")
            .with_mime_type("application/pdf")
            .validate(DEFAULT_MIME_TYPE)
            .unwrap()
            .create_document_request();
        assert_eq!(hints.suggested_name, " report.pdf");
        assert_eq!(hints.mime_type, "application/pdf");
    }

    #[test]
    fn test_decode_payload_is_permissive_about_layout() {
        assert_eq!(decode_payload("aGVsbG8=").unwrap(), b"hello");
        assert_eq!(decode_payload("aGVsbG8").unwrap(), b"hello");
        assert_eq!(decode_payload("aGVs\nbG8=\r\n").unwrap(), b"hello");
        assert!(decode_payload("").unwrap().is_empty());
    }

    #[test]
    fn test_decode_payload_accepts_trailing_bits() {
        assert_eq!(decode_payload("aGk=").unwrap(), b"hi");
        assert_eq!(decode_payload("aGl=").unwrap(), b"hi");
        assert_eq!(decode_payload("aGl").unwrap(), b"hi");
    }

    #[test]
    fn test_decode_payload_rejects_foreign_characters() {
        assert!(matches!(decode_payload("not-valid-base64!!"), Err(SaveError::Decode(_))));
        assert!(matches!(decode_payload("aGVsbG8_"), Err(SaveError::Decode(_))));
    }

    #[test]
    fn test_complete_writes_and_resolves() {
        let store = InMemoryContentStore::new();
        let (request, mut rx) = pending("aGVsbG8=");

        assert!(request.complete(PickerOutcome::selected("mem://deck"), &store));

        let saved = rx.try_recv().unwrap().unwrap();
        assert_eq!(saved.uri, "mem://deck");
        assert_eq!(saved.mime_type, "text/plain");
        assert_eq!(store.contents(&"mem://deck".into()).unwrap(), b"hello");
    }

    #[test]
    fn test_complete_cancelled_never_opens_sink() {
        let store = InMemoryContentStore::new();
        let (request, mut rx) = pending("aGVsbG8=");

        request.complete(PickerOutcome::cancelled(), &store);

        assert!(matches!(rx.try_recv().unwrap(), Err(SaveError::UserCancelled)));
        assert_eq!(store.open_count(), 0);
    }

    #[test]
    fn test_complete_ok_status_without_data_is_cancellation() {
        let store = InMemoryContentStore::new();
        let (request, mut rx) = pending("aGVsbG8=");

        let outcome = PickerOutcome {
            status: PickerStatus::Ok,
            data: None,
        };
        request.complete(outcome, &store);

        assert!(matches!(rx.try_recv().unwrap(), Err(SaveError::UserCancelled)));
    }

    #[test]
    fn test_complete_without_destination() {
        let store = InMemoryContentStore::new();
        let (request, mut rx) = pending("aGVsbG8=");

        request.complete(PickerOutcome::without_destination(), &store);

        assert!(matches!(rx.try_recv().unwrap(), Err(SaveError::NoDestination)));
        assert_eq!(store.open_count(), 0);
    }

    #[test]
    fn test_complete_with_dropped_requester_still_writes() {
        let store = InMemoryContentStore::new();
        let (request, rx) = pending("aGVsbG8=");
        drop(rx);

        assert!(!request.complete(PickerOutcome::selected("mem://orphan"), &store));
        assert_eq!(store.contents(&"mem://orphan".into()).unwrap(), b"hello");
    }
}
