//! Submission endpoint
//!
//! `POST /api/audio/analyze` with multipart field `file` (and optionally a
//! text field `origin`). Returns the backend's JSON body unchanged on success.

use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::Value;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use toxscan_common::{MediaAsset, Origin};

use crate::error::{ApiError, ApiResult};
use crate::AppState;

const FALLBACK_MIME: &str = "application/octet-stream";

/// POST /api/audio/analyze
pub async fn analyze_audio(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<Value>> {
    let request_id = Uuid::new_v4();
    let span = info_span!("analyze", request_id = %request_id);

    async move {
        let multipart = multipart.map_err(|rejection| {
            warn!("Rejected non-multipart submission: {}", rejection);
            ApiError::BadRequest("No file provided".to_string())
        })?;
        let asset = read_asset(multipart).await?;
        info!(
            file = %asset.name(),
            mime_type = %asset.mime_type(),
            size_bytes = asset.size_bytes(),
            origin = %asset.origin(),
            "Received analysis submission"
        );

        match state.relay.relay(&asset).await {
            Ok(relayed) => Ok(Json(relayed.body)),
            Err(err) => {
                // The precise kind goes to the log; the client sees the class via status
                error!(kind = err.kind(), status = err.status_code(), "Relay failed: {}", err);
                Err(ApiError::Relay(err))
            }
        }
    }
    .instrument(span)
    .await
}

/// Pull the `file` (and optional `origin`) fields out of the form
async fn read_asset(mut multipart: Multipart) -> ApiResult<MediaAsset> {
    let mut file: Option<(String, String, axum::body::Bytes)> = None;
    let mut origin = Origin::Picked;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        match field.name() {
            Some("file") if file.is_none() => {
                let name = field.file_name().unwrap_or_default().to_string();
                let mime_type = field.content_type().unwrap_or(FALLBACK_MIME).to_string();
                let bytes = field.bytes().await.map_err(multipart_error)?;
                file = Some((name, mime_type, bytes));
            }
            Some("origin") => {
                let text = field.text().await.map_err(multipart_error)?;
                match text.parse::<Origin>() {
                    Ok(parsed) => origin = parsed,
                    Err(e) => warn!("Ignoring origin field: {}", e),
                }
            }
            _ => {}
        }
    }

    let Some((name, mime_type, bytes)) = file else {
        return Err(ApiError::BadRequest("No file provided".to_string()));
    };

    if name.trim().is_empty() {
        return Err(ApiError::BadRequest("No selected file".to_string()));
    }

    Ok(MediaAsset::new(name, mime_type, bytes, origin))
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge("File exceeds the upload limit".to_string())
    } else {
        ApiError::BadRequest(format!("Invalid multipart body: {}", err.body_text()))
    }
}
