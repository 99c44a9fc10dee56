//! One user's analysis session: a capture controller plus an orchestrator

use std::sync::Arc;

use tokio::task::JoinHandle;
use toxscan_common::{AnalysisBackend, AnalysisResponse, MediaAsset};

use crate::capture::CaptureController;
use crate::error::CaptureError;
use crate::orchestrator::{AnalysisOrchestrator, RequestStatus, SubmitOutcome};
use crate::projection::{project, ReportView};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Capture,
    Results,
}

pub struct AnalysisSession {
    capture: CaptureController,
    orchestrator: Arc<AnalysisOrchestrator>,
}

impl AnalysisSession {
    pub fn new(capture: CaptureController, backend: Arc<dyn AnalysisBackend>) -> Self {
        Self {
            capture,
            orchestrator: Arc::new(AnalysisOrchestrator::new(backend)),
        }
    }

    pub fn capture(&self) -> &CaptureController {
        &self.capture
    }

    pub fn capture_mut(&mut self) -> &mut CaptureController {
        &mut self.capture
    }

    pub fn orchestrator(&self) -> &AnalysisOrchestrator {
        &self.orchestrator
    }

    pub async fn phase(&self) -> Phase {
        match self.orchestrator.status().await {
            RequestStatus::Succeeded => Phase::Results,
            _ => Phase::Capture,
        }
    }

    /// Start recording; refused while an analysis is in flight.
    pub async fn start_recording(&mut self) -> Result<(), CaptureError> {
        if self.orchestrator.is_in_flight().await {
            return Err(CaptureError::SubmissionInFlight);
        }
        self.capture.start_recording().await
    }

    pub async fn stop_recording(&mut self) -> Result<Option<MediaAsset>, CaptureError> {
        self.capture.stop_recording().await
    }

    /// Submit the active asset; a no-op without one.
    pub async fn submit(&self) -> SubmitOutcome {
        self.orchestrator.submit(self.capture.active_asset()).await
    }

    /// Submit on a background task so capture stays responsive meanwhile.
    pub fn spawn_submit(&self) -> JoinHandle<SubmitOutcome> {
        let orchestrator = Arc::clone(&self.orchestrator);
        let asset = self.capture.active_asset().cloned();
        tokio::spawn(async move { orchestrator.submit(asset.as_ref()).await })
    }

    pub async fn response(&self) -> Option<AnalysisResponse> {
        self.orchestrator.response().await
    }

    /// Display model of the stored result, if any
    pub async fn report(&self) -> Option<ReportView> {
        let response = self.orchestrator.response().await?;
        let file_name = self
            .orchestrator
            .asset_name()
            .await
            .unwrap_or_default();
        Some(project(&file_name, &response))
    }

    /// Back to a fresh capture phase.
    pub async fn reset(&mut self) {
        self.capture.reset();
        self.orchestrator.reset().await;
    }
}
