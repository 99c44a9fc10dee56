//! HTTP client for a running toxscan-relay
//!
//! The relay's error bodies carry a `kind` tag next to the message, which is
//! how the typed [`RelayError`] survives the extra HTTP hop.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;
use toxscan_common::{AnalysisBackend, AnalysisResponse, MediaAsset, RelayError};

/// Submission route on the relay
pub const ANALYZE_PATH: &str = "/api/audio/analyze";

const USER_AGENT: &str = concat!("toxscan/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
    #[serde(default)]
    kind: Option<String>,
}

pub struct RelayClient {
    http_client: reqwest::Client,
    relay_url: String,
}

impl RelayClient {
    pub fn new(relay_url: impl Into<String>) -> toxscan_common::Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| toxscan_common::Error::Internal(format!("HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            relay_url: relay_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn relay_url(&self) -> &str {
        &self.relay_url
    }
}

#[async_trait]
impl AnalysisBackend for RelayClient {
    async fn analyze(&self, asset: &MediaAsset) -> Result<AnalysisResponse, RelayError> {
        let url = format!("{}{}", self.relay_url, ANALYZE_PATH);
        debug!("POST {} ({} bytes)", url, asset.size_bytes());

        let response = self
            .http_client
            .post(&url)
            .multipart(submission_form(asset))
            .send()
            .await
            .map_err(|e| {
                RelayError::BackendUnreachable(format!("relay at {}: {}", self.relay_url, e))
            })?;

        let status = response.status();
        let raw = response
            .bytes()
            .await
            .map_err(|e| RelayError::BackendUnreachable(format!("reading relay response: {}", e)))?;

        if !status.is_success() {
            return Err(match serde_json::from_slice::<ErrorBody>(&raw) {
                Ok(body) => {
                    RelayError::from_kind(body.kind.as_deref(), status.as_u16(), body.error)
                }
                Err(_) => RelayError::BackendRejected {
                    status: status.as_u16(),
                    body: String::from_utf8_lossy(&raw).into_owned(),
                },
            });
        }

        let value: Value = serde_json::from_slice(&raw)
            .map_err(|e| RelayError::MalformedResponse(format!("relay body is not JSON: {}", e)))?;
        AnalysisResponse::from_value(&value).map_err(RelayError::MalformedResponse)
    }
}

/// `file` plus the `origin` tag the relay logs
fn submission_form(asset: &MediaAsset) -> Form {
    let part = || {
        Part::stream_with_length(asset.bytes().clone(), asset.size_bytes())
            .file_name(asset.name().to_string())
    };
    let file = part().mime_str(asset.mime_type()).unwrap_or_else(|_| part());

    Form::new()
        .text("origin", asset.origin().as_str())
        .part("file", file)
}
