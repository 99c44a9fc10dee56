//! # toxscan common library
//!
//! Shared code for the toxscan relay and client including:
//! - Media asset model and acquisition-source normalization
//! - Validation policy (type allow-list, size ceiling)
//! - Analysis response types (the backend wire contract)
//! - The `AnalysisBackend` seam and the relay failure taxonomy
//! - Configuration loading
//! - Timestamp and size formatting

pub mod analysis;
pub mod backend;
pub mod config;
pub mod error;
pub mod human_time;
pub mod media;
pub mod validation;

pub use analysis::{AnalysisResponse, Label, SentenceDetection};
pub use backend::{AnalysisBackend, RelayError};
pub use error::{Error, Result};
pub use media::{CandidateFile, MediaAsset, Origin};
pub use validation::{ValidationError, ValidationPolicy};
