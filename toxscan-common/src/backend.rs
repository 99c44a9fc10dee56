//! The analysis backend seam
//!
//! Both the in-process relay and the HTTP relay client implement
//! [`AnalysisBackend`]; the orchestrator only sees this trait.

use async_trait::async_trait;
use thiserror::Error;

use crate::analysis::AnalysisResponse;
use crate::media::MediaAsset;

/// Message shown to the user for every analysis failure
pub const GENERIC_FAILURE_MESSAGE: &str = "Failed to analyze file. Please try again.";

/// Typed failures crossing the relay boundary
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    /// No backend endpoint is configured
    #[error("Analysis backend is not configured")]
    BackendNotConfigured,

    /// Transport failure: unreachable host, connection reset, ...
    #[error("Analysis backend unreachable: {0}")]
    BackendUnreachable(String),

    /// Backend answered with a non-success status
    #[error("Analysis backend rejected the request with status {status}")]
    BackendRejected { status: u16, body: String },

    /// Backend answered with success but the body is not a valid analysis
    #[error("Analysis backend returned a malformed response: {0}")]
    MalformedResponse(String),
}

impl RelayError {
    /// HTTP status the relay answers with for this failure
    pub fn status_code(&self) -> u16 {
        match self {
            RelayError::BackendNotConfigured => 503,
            RelayError::BackendUnreachable(_) => 502,
            RelayError::BackendRejected { status, .. } => *status,
            RelayError::MalformedResponse(_) => 502,
        }
    }

    /// Stable tag carried in error bodies so the kind survives the HTTP hop
    pub fn kind(&self) -> &'static str {
        match self {
            RelayError::BackendNotConfigured => "backend_not_configured",
            RelayError::BackendUnreachable(_) => "backend_unreachable",
            RelayError::BackendRejected { .. } => "backend_rejected",
            RelayError::MalformedResponse(_) => "malformed_response",
        }
    }

    pub fn user_message(&self) -> &'static str {
        GENERIC_FAILURE_MESSAGE
    }

    /// Rebuild a typed failure from a relay error body.
    ///
    /// Unknown or missing kinds fall back to a rejection carrying the status.
    pub fn from_kind(kind: Option<&str>, status: u16, message: String) -> Self {
        match kind {
            Some("backend_not_configured") => RelayError::BackendNotConfigured,
            Some("backend_unreachable") => RelayError::BackendUnreachable(message),
            Some("malformed_response") => RelayError::MalformedResponse(message),
            _ => RelayError::BackendRejected {
                status,
                body: message,
            },
        }
    }
}

/// Anything that can turn a media asset into an analysis
#[async_trait]
pub trait AnalysisBackend: Send + Sync {
    async fn analyze(&self, asset: &MediaAsset) -> Result<AnalysisResponse, RelayError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(RelayError::BackendNotConfigured.status_code(), 503);
        assert_eq!(RelayError::BackendUnreachable("refused".into()).status_code(), 502);
        assert_eq!(
            RelayError::BackendRejected { status: 500, body: String::new() }.status_code(),
            500
        );
        assert_eq!(RelayError::MalformedResponse("x".into()).status_code(), 502);
    }

    #[test]
    fn test_kind_survives_round_trip() {
        let errors = [
            RelayError::BackendNotConfigured,
            RelayError::BackendUnreachable("m".into()),
            RelayError::MalformedResponse("m".into()),
        ];
        for err in errors {
            let rebuilt = RelayError::from_kind(Some(err.kind()), err.status_code(), "m".into());
            assert_eq!(rebuilt.kind(), err.kind());
        }
    }

    #[test]
    fn test_unknown_kind_is_rejection() {
        let err = RelayError::from_kind(None, 418, "teapot".into());
        assert_eq!(
            err,
            RelayError::BackendRejected { status: 418, body: "teapot".into() }
        );
    }
}
