//! Analysis request orchestration
//!
//! [`RequestStatus::on`] is the whole transition table. A submit that the
//! table ignores never reaches the backend, which is what keeps at most one
//! request outstanding per session.

use std::sync::Arc;

use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};
use toxscan_common::{AnalysisBackend, AnalysisResponse, MediaAsset, RelayError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStatus {
    Idle,
    InFlight,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestEvent {
    Submit,
    Complete,
    Fail,
    Reset,
}

impl RequestStatus {
    /// Next status for `event`, or `None` when the event is ignored here
    pub fn on(self, event: RequestEvent) -> Option<RequestStatus> {
        use RequestEvent::*;
        use RequestStatus::*;

        match (self, event) {
            (Idle | Failed, Submit) => Some(InFlight),
            (InFlight, Complete) => Some(Succeeded),
            (InFlight, Fail) => Some(Failed),
            (_, Reset) => Some(Idle),
            _ => None,
        }
    }
}

/// What a call to [`AnalysisOrchestrator::submit`] did
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// No asset, or a request was already in flight or finished
    Ignored,
    Succeeded(AnalysisResponse),
    Failed(RelayError),
    /// The session was reset while the request was outstanding; result dropped
    Discarded,
}

#[derive(Debug)]
struct RequestState {
    status: RequestStatus,
    /// Bumped on every accepted submit and every reset
    generation: u64,
    asset_name: Option<String>,
    response: Option<AnalysisResponse>,
    failure: Option<RelayError>,
    /// Backend call of the in-flight request
    outstanding: Option<JoinHandle<()>>,
}

pub struct AnalysisOrchestrator {
    backend: Arc<dyn AnalysisBackend>,
    state: Mutex<RequestState>,
}

impl AnalysisOrchestrator {
    pub fn new(backend: Arc<dyn AnalysisBackend>) -> Self {
        Self {
            backend,
            state: Mutex::new(RequestState {
                status: RequestStatus::Idle,
                generation: 0,
                asset_name: None,
                response: None,
                failure: None,
                outstanding: None,
            }),
        }
    }

    pub async fn status(&self) -> RequestStatus {
        self.state.lock().await.status
    }

    pub async fn is_in_flight(&self) -> bool {
        self.status().await == RequestStatus::InFlight
    }

    pub async fn response(&self) -> Option<AnalysisResponse> {
        self.state.lock().await.response.clone()
    }

    /// Precise failure kind of the last request, for logs and diagnostics
    pub async fn failure(&self) -> Option<RelayError> {
        self.state.lock().await.failure.clone()
    }

    /// Name of the asset behind the current or last request
    pub async fn asset_name(&self) -> Option<String> {
        self.state.lock().await.asset_name.clone()
    }

    /// Generic retry message while failed
    pub async fn user_message(&self) -> Option<&'static str> {
        self.state
            .lock()
            .await
            .failure
            .as_ref()
            .map(RelayError::user_message)
    }

    /// Send `asset` to the backend unless the transition table ignores it.
    pub async fn submit(&self, asset: Option<&MediaAsset>) -> SubmitOutcome {
        let Some(asset) = asset else {
            debug!("Submit without an active asset ignored");
            return SubmitOutcome::Ignored;
        };

        let (generation, reply) = {
            let mut state = self.state.lock().await;
            let Some(next) = state.status.on(RequestEvent::Submit) else {
                debug!("Submit ignored while {:?}", state.status);
                return SubmitOutcome::Ignored;
            };
            state.status = next;
            state.generation += 1;
            state.asset_name = Some(asset.name().to_string());
            state.response = None;
            state.failure = None;

            info!(
                "Submitting {} ({}, {} bytes) for analysis",
                asset.name(),
                asset.mime_type(),
                asset.size_bytes()
            );
            // Spawned under the lock so reset always finds the handle
            let backend = Arc::clone(&self.backend);
            let owned = asset.clone();
            let (tx, rx) = oneshot::channel();
            state.outstanding = Some(tokio::spawn(async move {
                let _ = tx.send(backend.analyze(&owned).await);
            }));
            (state.generation, rx)
        };

        let reply = reply.await;

        let mut state = self.state.lock().await;
        if state.generation != generation {
            debug!("Analysis of {} finished after reset; result discarded", asset.name());
            return SubmitOutcome::Discarded;
        }
        state.outstanding = None;

        let result = reply.unwrap_or_else(|_| {
            Err(RelayError::MalformedResponse(
                "analysis ended without a response".to_string(),
            ))
        });

        match result {
            Ok(response) => {
                state.status = state
                    .status
                    .on(RequestEvent::Complete)
                    .unwrap_or(RequestStatus::Succeeded);
                state.response = Some(response.clone());
                info!(
                    "Analysis of {} complete: {} sentences",
                    asset.name(),
                    response.sentences.len()
                );
                SubmitOutcome::Succeeded(response)
            }
            Err(e) => {
                state.status = state
                    .status
                    .on(RequestEvent::Fail)
                    .unwrap_or(RequestStatus::Failed);
                state.failure = Some(e.clone());
                error!(kind = e.kind(), "Analysis of {} failed: {}", asset.name(), e);
                SubmitOutcome::Failed(e)
            }
        }
    }

    /// Back to idle. An outstanding backend call is cancelled and has
    /// stopped by the time this returns; its submit reports `Discarded`.
    pub async fn reset(&self) {
        let outstanding = {
            let mut state = self.state.lock().await;
            state.status = RequestStatus::Idle;
            state.generation += 1;
            state.asset_name = None;
            state.response = None;
            state.failure = None;
            state.outstanding.take()
        };

        if let Some(handle) = outstanding {
            debug!("Cancelling outstanding analysis request");
            handle.abort();
            let _ = handle.await;
        }
    }
}
