//! Capture controller
//!
//! Turns picker selections, drops and recordings into at most one active
//! [`MediaAsset`]. Every source is normalized through [`AssetSource`] before
//! the validation policy runs, so nothing downstream branches on origin.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{info, warn};
use toxscan_common::media::AssetSource;
use toxscan_common::{CandidateFile, MediaAsset, ValidationPolicy};

use crate::error::CaptureError;
use crate::recording::{CaptureDevice, RecordingSession, DEFAULT_TICK_INTERVAL};

pub struct CaptureController {
    policy: ValidationPolicy,
    device: Arc<dyn CaptureDevice>,
    tick_interval: Duration,
    active: Option<MediaAsset>,
    error: Option<CaptureError>,
    recording: Option<RecordingSession>,
}

impl CaptureController {
    pub fn new(device: Arc<dyn CaptureDevice>, policy: ValidationPolicy) -> Self {
        Self {
            policy,
            device,
            tick_interval: DEFAULT_TICK_INTERVAL,
            active: None,
            error: None,
            recording: None,
        }
    }

    pub fn with_tick_interval(mut self, tick_interval: Duration) -> Self {
        self.tick_interval = tick_interval;
        self
    }

    pub fn policy(&self) -> &ValidationPolicy {
        &self.policy
    }

    pub fn active_asset(&self) -> Option<&MediaAsset> {
        self.active.as_ref()
    }

    /// Last user-visible error, cleared by the next successful action
    pub fn error(&self) -> Option<&CaptureError> {
        self.error.as_ref()
    }

    pub fn is_recording(&self) -> bool {
        self.recording.is_some()
    }

    /// Elapsed ticks of the active recording, zero when idle
    pub fn elapsed_seconds(&self) -> u64 {
        self.recording
            .as_ref()
            .map(RecordingSession::elapsed_seconds)
            .unwrap_or(0)
    }

    pub fn elapsed_updates(&self) -> Option<watch::Receiver<u64>> {
        self.recording.as_ref().map(RecordingSession::subscribe_elapsed)
    }

    pub fn select_from_picker(&mut self, file: CandidateFile) -> Result<(), CaptureError> {
        self.accept(AssetSource::Picked(file))
    }

    /// Only the first dropped file is considered; an empty drop does nothing.
    pub fn select_from_drop(&mut self, files: Vec<CandidateFile>) -> Result<(), CaptureError> {
        if files.len() > 1 {
            info!("{} files dropped; using the first", files.len());
        }
        self.accept(AssetSource::Dropped(files))
    }

    fn accept(&mut self, source: AssetSource) -> Result<(), CaptureError> {
        let Some(candidate) = source.normalize() else {
            return Ok(());
        };

        if let Err(e) = self.policy.validate(&candidate) {
            warn!(
                "Rejected {} ({}, {} bytes): {}",
                candidate.name(),
                candidate.mime_type(),
                candidate.size_bytes(),
                e
            );
            return Err(self.fail(e.into()));
        }

        info!(
            "Accepted {} ({}, {} bytes, {})",
            candidate.name(),
            candidate.mime_type(),
            candidate.size_bytes(),
            candidate.origin()
        );
        self.active = Some(candidate);
        self.error = None;
        Ok(())
    }

    /// Acquire the capture device and start a recording.
    ///
    /// The previous active asset is dropped once capture is running.
    pub async fn start_recording(&mut self) -> Result<(), CaptureError> {
        if self.recording.is_some() {
            return Err(CaptureError::AlreadyRecording);
        }

        match RecordingSession::start(self.device.as_ref(), self.tick_interval).await {
            Ok(session) => {
                self.active = None;
                self.error = None;
                self.recording = Some(session);
                Ok(())
            }
            Err(e) => {
                warn!("Could not start recording: {}", e);
                Err(self.fail(e))
            }
        }
    }

    /// Finish the active recording and make it the active asset.
    ///
    /// Returns `Ok(None)` when nothing was recording. Recordings are checked
    /// for size only; their container type is fixed.
    pub async fn stop_recording(&mut self) -> Result<Option<MediaAsset>, CaptureError> {
        let Some(session) = self.recording.take() else {
            return Ok(None);
        };

        let file = match session.stop().await {
            Ok(file) => file,
            Err(e) => {
                warn!("Recording could not be finalized: {}", e);
                return Err(self.fail(e));
            }
        };

        let Some(asset) = AssetSource::Recorded(file).normalize() else {
            return Ok(None);
        };
        if let Err(e) = self.policy.check_size(asset.size_bytes()) {
            warn!("Recording {} rejected: {}", asset.name(), e);
            return Err(self.fail(e.into()));
        }

        info!("Recording {} is the active asset ({} bytes)", asset.name(), asset.size_bytes());
        self.active = Some(asset.clone());
        self.error = None;
        Ok(Some(asset))
    }

    /// Clear the active asset, the error, and any recording in progress.
    pub fn reset(&mut self) {
        if self.recording.take().is_some() {
            info!("Recording discarded by reset");
        }
        self.active = None;
        self.error = None;
    }

    fn fail(&mut self, error: CaptureError) -> CaptureError {
        self.error = Some(error.clone());
        error
    }
}
