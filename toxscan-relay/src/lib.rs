//! toxscan-relay library
//!
//! Client-facing submission endpoint in front of the external analysis
//! backend. Exposed as a library so the router can be driven in tests.

use axum::extract::DefaultBodyLimit;
use axum::Router;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use toxscan_common::ValidationPolicy;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod demo;
pub mod error;
pub mod relay;

pub use crate::error::{ApiError, ApiResult};
pub use crate::relay::{BackendRelay, RelayedAnalysis, ANALYZE_PATH};

/// Allowance for multipart boundaries and part headers on top of the media
pub const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Relay to the external backend
    pub relay: Arc<BackendRelay>,
    /// Upload ceiling source for the request body limit
    pub policy: ValidationPolicy,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(relay: BackendRelay, policy: ValidationPolicy) -> Self {
        Self {
            relay: Arc::new(relay),
            policy,
            startup_time: Utc::now(),
        }
    }

    /// Request body limit for the submission endpoint
    pub fn body_limit(&self) -> usize {
        usize::try_from(self.policy.max_size_bytes())
            .unwrap_or(usize::MAX)
            .saturating_add(MULTIPART_OVERHEAD_BYTES)
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post};

    let submission = Router::new()
        .route(ANALYZE_PATH, post(api::analyze_audio))
        .layer(DefaultBodyLimit::max(state.body_limit()));

    Router::new()
        .merge(submission)
        .route("/api/buildinfo", get(api::get_build_info))
        .merge(api::health_routes())
        .layer(CatchPanicLayer::custom(error::panic_response))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
