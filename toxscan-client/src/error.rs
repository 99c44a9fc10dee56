//! Capture-side error types
//!
//! Everything here is recovered locally and shown inline; none of these ever
//! reach the network layer.

use std::path::PathBuf;

use thiserror::Error;
use toxscan_common::human_time::format_size_mb;
use toxscan_common::ValidationError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Platform refused microphone access
    #[error("Microphone access denied: {0}")]
    PermissionDenied(String),

    /// No usable input device
    #[error("No capture device available: {0}")]
    DeviceUnavailable(String),

    #[error("A recording is already in progress")]
    AlreadyRecording,

    #[error("An analysis request is in flight")]
    SubmissionInFlight,

    /// Captured fragments could not be packaged into the recording container
    #[error("Failed to finalize recording: {0}")]
    Finalization(String),
}

impl CaptureError {
    /// Inline message for the presentation layer
    pub fn user_message(&self) -> String {
        match self {
            CaptureError::Validation(ValidationError::UnsupportedType { .. }) => {
                "Please upload an audio or video file (MP3, WAV, OGG, FLAC, MP4, WebM).".into()
            }
            CaptureError::Validation(ValidationError::TooLarge {
                size_bytes,
                max_size_bytes,
            }) => format!(
                "File is too large ({}). Maximum size is {}.",
                format_size_mb(*size_bytes),
                format_size_mb(*max_size_bytes)
            ),
            CaptureError::PermissionDenied(_) => {
                "Could not access microphone. Please check permissions.".to_string()
            }
            CaptureError::DeviceUnavailable(_) => "No microphone was found.".to_string(),
            CaptureError::AlreadyRecording => "A recording is already in progress.".to_string(),
            CaptureError::SubmissionInFlight => {
                "Please wait for the current analysis to finish.".to_string()
            }
            CaptureError::Finalization(_) => {
                "The recording could not be saved. Please try again.".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_too_large_message_shows_megabytes() {
        let err = CaptureError::from(ValidationError::TooLarge {
            size_bytes: 2 * 1024 * 1024,
            max_size_bytes: 1024 * 1024,
        });
        assert_eq!(
            err.user_message(),
            "File is too large (2.00 MB). Maximum size is 1.00 MB."
        );
    }
}

/// Failure loading the file offered from disk
#[derive(Debug, Error)]
pub enum OfferError {
    /// Refused before the content was read
    #[error(transparent)]
    Rejected(#[from] ValidationError),

    #[error("Cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
