//! Validation policy for candidate media assets
//!
//! The verdict depends only on `(mime_type, size_bytes)`; the asset's origin
//! and name never influence it.

use std::collections::BTreeSet;
use thiserror::Error;

use crate::media::{canonical_mime, MediaAsset};

/// Upload ceiling: 100 MiB
pub const DEFAULT_MAX_SIZE_BYTES: u64 = 100 * 1024 * 1024;

/// MIME types the analysis backend can transcribe
pub const DEFAULT_ALLOWED_MIME_TYPES: &[&str] = &[
    "audio/mpeg",
    "audio/mp3",
    "audio/wav",
    "audio/wave",
    "audio/x-wav",
    "audio/webm",
    "audio/ogg",
    "audio/mp4",
    "audio/x-m4a",
    "audio/m4a",
    "audio/flac",
    "audio/x-flac",
    "video/mp4",
    "video/webm",
];

/// Reasons a candidate asset is refused
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Unsupported file type: {mime_type}")]
    UnsupportedType { mime_type: String },

    #[error("File too large: {size_bytes} bytes (limit {max_size_bytes} bytes)")]
    TooLarge { size_bytes: u64, max_size_bytes: u64 },
}

/// Type allow-list plus size ceiling
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationPolicy {
    allowed_mime_types: BTreeSet<String>,
    max_size_bytes: u64,
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_ALLOWED_MIME_TYPES.iter().copied(), DEFAULT_MAX_SIZE_BYTES)
    }
}

impl ValidationPolicy {
    pub fn new<'a>(allowed: impl IntoIterator<Item = &'a str>, max_size_bytes: u64) -> Self {
        Self {
            allowed_mime_types: allowed.into_iter().map(canonical_mime).collect(),
            max_size_bytes,
        }
    }

    pub fn max_size_bytes(&self) -> u64 {
        self.max_size_bytes
    }

    pub fn allows_type(&self, mime_type: &str) -> bool {
        self.allowed_mime_types.contains(&canonical_mime(mime_type))
    }

    /// Check a `(mime_type, size_bytes)` pair. Type is checked before size.
    pub fn check(&self, mime_type: &str, size_bytes: u64) -> Result<(), ValidationError> {
        if !self.allows_type(mime_type) {
            return Err(ValidationError::UnsupportedType {
                mime_type: mime_type.to_string(),
            });
        }
        self.check_size(size_bytes)
    }

    /// Size-only check, used for recordings whose container type is fixed
    pub fn check_size(&self, size_bytes: u64) -> Result<(), ValidationError> {
        if size_bytes > self.max_size_bytes {
            return Err(ValidationError::TooLarge {
                size_bytes,
                max_size_bytes: self.max_size_bytes,
            });
        }
        Ok(())
    }

    pub fn validate(&self, candidate: &MediaAsset) -> Result<(), ValidationError> {
        self.check(candidate.mime_type(), candidate.size_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::Origin;

    #[test]
    fn test_accepts_two_megabyte_mp3() {
        let policy = ValidationPolicy::default();
        let asset = MediaAsset::new("talk.mp3", "audio/mpeg", vec![0u8; 2_000_000], Origin::Picked);
        assert_eq!(policy.validate(&asset), Ok(()));
    }

    #[test]
    fn test_rejects_pdf() {
        let policy = ValidationPolicy::default();
        let asset = MediaAsset::new("paper.pdf", "application/pdf", vec![0u8; 10], Origin::Picked);
        assert_eq!(
            policy.validate(&asset),
            Err(ValidationError::UnsupportedType {
                mime_type: "application/pdf".to_string()
            })
        );
    }

    #[test]
    fn test_size_ceiling_is_inclusive() {
        let policy = ValidationPolicy::new(["audio/wav"], 8);
        assert!(policy.check("audio/wav", 8).is_ok());
        assert_eq!(
            policy.check("audio/wav", 9),
            Err(ValidationError::TooLarge {
                size_bytes: 9,
                max_size_bytes: 8
            })
        );
    }

    #[test]
    fn test_verdict_ignores_origin() {
        let policy = ValidationPolicy::new(["audio/wav"], 4);
        let verdicts: Vec<_> = [Origin::Picked, Origin::Dropped, Origin::Recorded]
            .into_iter()
            .map(|origin| policy.validate(&MediaAsset::new("x", "audio/wav", vec![0u8; 5], origin)))
            .collect();
        assert!(verdicts.windows(2).all(|w| w[0] == w[1]));
        assert!(verdicts[0].is_err());
    }

    #[test]
    fn test_type_match_ignores_case_and_parameters() {
        let policy = ValidationPolicy::default();
        assert!(policy.allows_type("Audio/WebM; codecs=opus"));
        assert!(!policy.allows_type("application/octet-stream"));
    }
}
