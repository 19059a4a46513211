use serde::Serialize;
use thiserror::Error;

/// Result type for save operations.
pub type Result<T> = std::result::Result<T, SaveError>;

/// Errors that can terminate a save request.
///
/// Every variant is terminal for the request that triggered it. The `Display` output is the
/// human-readable message delivered on the caller's reject path; the underlying cause, when
/// there is one, is available through [`std::error::Error::source`].
#[derive(Debug, Error)]
pub enum SaveError {
    /// Another request already occupies the pending slot
    #[error("Another save operation is already in progress.")]
    Busy,

    /// A required field of the request is missing or blank
    #[error("{message}")]
    InvalidArgument { message: String },

    /// The picker surface refused to start
    #[error("Unable to launch save dialog.")]
    Launch {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The user dismissed the picker
    #[error("User canceled")]
    UserCancelled,

    /// The picker finished without a destination
    #[error("No file selected.")]
    NoDestination,

    /// The payload is not valid base64
    #[error("Unable to decode document data.")]
    Decode(#[from] base64::DecodeError),

    /// The storage surface could not provide a sink for the destination
    #[error("Unable to open destination.")]
    DestinationUnavailable {
        #[source]
        source: Option<std::io::Error>,
    },

    /// Writing, flushing or closing the sink failed
    #[error("Failed to save document.")]
    Write {
        #[source]
        source: std::io::Error,
    },

    /// The completion channel closed before the request was resolved
    #[error("Save operation was abandoned before completion.")]
    Abandoned,
}

impl SaveError {
    pub(crate) fn invalid_argument(message: impl Into<String>) -> Self {
        SaveError::InvalidArgument {
            message: message.into(),
        }
    }

    /// Stable machine-readable code for the scripted caller.
    pub fn code(&self) -> &'static str {
        match self {
            SaveError::Busy => "BUSY",
            SaveError::InvalidArgument { .. } => "INVALID_ARGUMENT",
            SaveError::Launch { .. } => "LAUNCH_FAILED",
            SaveError::UserCancelled => "USER_CANCELLED",
            SaveError::NoDestination => "NO_DESTINATION",
            SaveError::Decode(_) => "DECODE_FAILED",
            SaveError::DestinationUnavailable { .. } => "DESTINATION_UNAVAILABLE",
            SaveError::Write { .. } => "WRITE_FAILED",
            SaveError::Abandoned => "ABANDONED",
        }
    }

    /// Build the payload sent on the caller's reject path.
    pub fn to_rejection(&self) -> Rejection {
        let cause = std::error::Error::source(self).map(|source| source.to_string());
        Rejection {
            code: self.code(),
            message: self.to_string(),
            cause,
        }
    }
}

/// Serializable form of a [`SaveError`] for the scripted caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rejection {
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_error_keeps_io_cause() {
        let err = SaveError::Write {
            source: std::io::Error::other("disk full"),
        };
        let rejection = err.to_rejection();

        assert_eq!(rejection.code, "WRITE_FAILED");
        assert_eq!(rejection.message, "Failed to save document.");
        assert_eq!(rejection.cause.as_deref(), Some("disk full"));
    }

    #[test]
    fn test_rejection_without_cause_omits_field() {
        let json = serde_json::to_value(SaveError::UserCancelled.to_rejection()).unwrap();

        assert_eq!(json["code"], "USER_CANCELLED");
        assert_eq!(json["message"], "User canceled");
        assert!(json.get("cause").is_none());
    }
}
