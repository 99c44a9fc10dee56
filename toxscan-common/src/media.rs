//! Media asset model
//!
//! Every acquisition path (file picker, drag-and-drop, live recording) ends in
//! one canonical [`MediaAsset`]. Acquisition sources are described by
//! [`AssetSource`] and normalized before validation runs, so downstream code
//! never branches on where an asset came from.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Where a media asset was acquired from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// Chosen through a file picker
    Picked,
    /// Dropped onto the capture area
    Dropped,
    /// Captured live from the microphone
    Recorded,
}

impl Origin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Origin::Picked => "picked",
            Origin::Dropped => "dropped",
            Origin::Recorded => "recorded",
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Origin {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "picked" => Ok(Origin::Picked),
            "dropped" => Ok(Origin::Dropped),
            "recorded" => Ok(Origin::Recorded),
            other => Err(format!("unknown origin '{}'", other)),
        }
    }
}

/// A file offered by the platform before it becomes an asset
#[derive(Debug, Clone)]
pub struct CandidateFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Bytes,
}

impl CandidateFile {
    pub fn new(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        bytes: impl Into<Bytes>,
    ) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes: bytes.into(),
        }
    }
}

/// Acquisition source, tagged by origin
#[derive(Debug, Clone)]
pub enum AssetSource {
    Picked(CandidateFile),
    /// A drop may carry several files; only the first is used
    Dropped(Vec<CandidateFile>),
    Recorded(CandidateFile),
}

impl AssetSource {
    /// Normalize into the canonical asset shape.
    ///
    /// Returns `None` when the source carries nothing (an empty drop).
    pub fn normalize(self) -> Option<MediaAsset> {
        match self {
            AssetSource::Picked(file) => Some(MediaAsset::from_candidate(file, Origin::Picked)),
            AssetSource::Dropped(files) => files
                .into_iter()
                .next()
                .map(|file| MediaAsset::from_candidate(file, Origin::Dropped)),
            AssetSource::Recorded(file) => Some(MediaAsset::from_candidate(file, Origin::Recorded)),
        }
    }
}

/// One unit of captured media accepted for analysis
///
/// Immutable once created. The payload is reference counted, so cloning an
/// asset to hand it to a request does not copy the media bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaAsset {
    name: String,
    mime_type: String,
    bytes: Bytes,
    origin: Origin,
}

impl MediaAsset {
    pub fn new(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        bytes: impl Into<Bytes>,
        origin: Origin,
    ) -> Self {
        Self {
            name: name.into(),
            mime_type: canonical_mime(&mime_type.into()),
            bytes: bytes.into(),
            origin,
        }
    }

    fn from_candidate(file: CandidateFile, origin: Origin) -> Self {
        Self::new(file.name, file.mime_type, file.bytes, origin)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Canonical (lowercase, parameter-free) MIME type
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn size_bytes(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }
}

/// Lowercase a MIME type and strip any parameters.
///
/// `"Audio/WebM; codecs=opus"` becomes `"audio/webm"`.
pub fn canonical_mime(mime_type: &str) -> String {
    mime_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}
