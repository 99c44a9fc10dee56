//! Backend relay
//!
//! Forwards one media asset to the external analysis backend and normalizes
//! the outcome. The steps run strictly in order:
//! 1. No backend configured → `BackendNotConfigured` (or demo data, if opted in)
//! 2. POST the asset as multipart field `file` to `<backend>/api/audio/analyze`
//! 3. Transport failure → `BackendUnreachable`
//! 4. Non-success status → `BackendRejected` with the status verbatim
//! 5. Success → body parsed, structurally checked, passed through unchanged
//!
//! No retries. The asset is never stored; it only lives in the request body.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use tracing::{debug, info, warn};

use toxscan_common::{AnalysisBackend, AnalysisResponse, MediaAsset, RelayError};

use crate::demo;

/// Path of the analysis endpoint, identical on relay and backend
pub const ANALYZE_PATH: &str = "/api/audio/analyze";

const USER_AGENT: &str = concat!("toxscan-relay/", env!("CARGO_PKG_VERSION"));

/// Outcome of one successful relay call
#[derive(Debug, Clone)]
pub struct RelayedAnalysis {
    /// Backend body exactly as received
    pub body: Value,
    /// Typed view of `body`
    pub response: AnalysisResponse,
    /// True when the body is the opt-in demo report
    pub demo: bool,
}

/// Relay to the external analysis backend
pub struct BackendRelay {
    http_client: reqwest::Client,
    backend_url: Option<String>,
    demo_fallback: bool,
}

impl BackendRelay {
    /// Create a relay.
    ///
    /// `backend_url` is the backend base URL; `None` means not configured.
    /// No request timeout is applied: a hung backend surfaces as a transport
    /// failure from the platform.
    pub fn new(backend_url: Option<String>, demo_fallback: bool) -> toxscan_common::Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| toxscan_common::Error::Internal(format!("HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            backend_url: backend_url.map(|url| url.trim_end_matches('/').to_string()),
            demo_fallback,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.backend_url.is_some()
    }

    pub fn demo_fallback(&self) -> bool {
        self.demo_fallback
    }

    /// Forward `asset` to the backend
    pub async fn relay(&self, asset: &MediaAsset) -> Result<RelayedAnalysis, RelayError> {
        let Some(backend_url) = self.backend_url.as_deref() else {
            if self.demo_fallback {
                warn!(
                    file = %asset.name(),
                    "No analysis backend configured, serving demo data (demo_fallback enabled)"
                );
                let body = demo::demo_body(asset.name());
                let response =
                    AnalysisResponse::from_value(&body).map_err(RelayError::MalformedResponse)?;
                return Ok(RelayedAnalysis {
                    body,
                    response,
                    demo: true,
                });
            }
            return Err(RelayError::BackendNotConfigured);
        };

        let url = format!("{}{}", backend_url, ANALYZE_PATH);
        debug!(
            url = %url,
            file = %asset.name(),
            size_bytes = asset.size_bytes(),
            "Forwarding asset to analysis backend"
        );

        let response = self
            .http_client
            .post(&url)
            .multipart(file_form(asset))
            .send()
            .await
            .map_err(|e| RelayError::BackendUnreachable(e.to_string()))?;

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Analysis backend rejected request");
            return Err(RelayError::BackendRejected {
                status: status.as_u16(),
                body,
            });
        }

        let raw = response
            .bytes()
            .await
            .map_err(|e| RelayError::BackendUnreachable(e.to_string()))?;

        let body: Value = serde_json::from_slice(&raw)
            .map_err(|e| RelayError::MalformedResponse(format!("body is not JSON: {}", e)))?;
        let parsed = AnalysisResponse::from_value(&body).map_err(RelayError::MalformedResponse)?;

        info!(
            file = %asset.name(),
            sentences = parsed.sentences.len(),
            "Analysis backend returned result"
        );

        Ok(RelayedAnalysis {
            body,
            response: parsed,
            demo: false,
        })
    }
}

#[async_trait]
impl AnalysisBackend for BackendRelay {
    async fn analyze(&self, asset: &MediaAsset) -> Result<AnalysisResponse, RelayError> {
        self.relay(asset).await.map(|relayed| relayed.response)
    }
}

/// One-field multipart form: `file` with the asset's bytes, name and type
fn file_form(asset: &MediaAsset) -> Form {
    let part = Part::stream_with_length(asset.bytes().clone(), asset.size_bytes())
        .file_name(asset.name().to_string());
    let part = match part.mime_str(asset.mime_type()) {
        Ok(part) => part,
        Err(_) => Part::stream_with_length(asset.bytes().clone(), asset.size_bytes())
            .file_name(asset.name().to_string()),
    };
    Form::new().part("file", part)
}
