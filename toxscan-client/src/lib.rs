//! toxscan client library
//!
//! Capture (picker, drop, microphone) → validation → submission to a relay →
//! result projection. The `toxscan` binary is a thin CLI over
//! [`AnalysisSession`].

pub mod capture;
pub mod error;
pub mod microphone;
pub mod orchestrator;
pub mod projection;
pub mod recording;
pub mod relay_client;
pub mod session;
pub mod sniff;
pub mod wav;

pub use capture::CaptureController;
pub use error::CaptureError;
pub use microphone::Microphone;
pub use orchestrator::{AnalysisOrchestrator, RequestStatus, SubmitOutcome};
pub use projection::{project, ReportView, Severity};
pub use recording::{CaptureDevice, OpenedStream, PcmFormat, RecordingSession, StreamHandle};
pub use relay_client::RelayClient;
pub use session::{AnalysisSession, Phase};
