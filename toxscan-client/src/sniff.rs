//! Media type detection for files read from disk
//!
//! Content sniffing first, then the extension, then
//! `application/octet-stream` (which no validation policy allows).

use std::path::{Path, PathBuf};

use tracing::{debug, info};
use toxscan_common::{CandidateFile, ValidationPolicy};

use crate::error::OfferError;

pub const FALLBACK_MIME: &str = "application/octet-stream";

/// Extensions recognized when the content is not conclusive
const EXTENSION_TYPES: &[(&str, &str)] = &[
    ("mp3", "audio/mpeg"),
    ("wav", "audio/wav"),
    ("mp4", "video/mp4"),
    ("webm", "video/webm"),
    ("ogg", "audio/ogg"),
    ("m4a", "audio/mp4"),
    ("flac", "audio/flac"),
];

pub fn detect_mime(path: &Path, content: &[u8]) -> String {
    if let Some(kind) = infer::get(content) {
        return kind.mime_type().to_string();
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    let by_extension = extension.as_deref().and_then(|ext| {
        EXTENSION_TYPES
            .iter()
            .find(|(known, _)| *known == ext)
            .map(|(_, mime)| *mime)
    });

    match by_extension {
        Some(mime) => {
            debug!("{}: type from extension ({})", path.display(), mime);
            mime.to_string()
        }
        None => FALLBACK_MIME.to_string(),
    }
}

/// The candidate name is the file name without directories.
fn candidate_from(path: &Path, bytes: Vec<u8>) -> CandidateFile {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let mime_type = detect_mime(path, &bytes);
    CandidateFile::new(name, mime_type, bytes)
}

/// Load the first of several offered paths; the rest are never touched.
///
/// Its size on disk is checked against `policy` before the content is read.
pub async fn read_first_offered(
    paths: &[PathBuf],
    policy: &ValidationPolicy,
) -> Result<Option<CandidateFile>, OfferError> {
    let Some((first, rest)) = paths.split_first() else {
        return Ok(None);
    };
    if !rest.is_empty() {
        info!("{} additional file(s) ignored; using {}", rest.len(), first.display());
    }

    let read_error = |source| OfferError::Read {
        path: first.clone(),
        source,
    };
    let metadata = tokio::fs::metadata(first).await.map_err(read_error)?;
    policy.check_size(metadata.len())?;

    let bytes = tokio::fs::read(first).await.map_err(read_error)?;
    Ok(Some(candidate_from(first, bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use toxscan_common::ValidationError;

    const MP3_ID3: &[u8] = b"ID3\x04\x00\x00\x00\x00\x00\x00";

    #[test]
    fn test_content_beats_extension() {
        assert_eq!(detect_mime(Path::new("voice.bin"), MP3_ID3), "audio/mpeg");
    }

    #[test]
    fn test_extension_fallback_is_case_insensitive() {
        assert_eq!(detect_mime(Path::new("clip.WEBM"), b"??"), "video/webm");
    }

    #[test]
    fn test_unknown_falls_back_to_octet_stream() {
        assert_eq!(detect_mime(Path::new("notes.txt"), b"hello"), FALLBACK_MIME);
    }

    fn write_file(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
        let path = dir.join(name);
        std::fs::File::create(&path).unwrap().write_all(content).unwrap();
        path
    }

    #[tokio::test]
    async fn test_first_offered_uses_bare_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "talk.mp3", MP3_ID3);

        let candidate = read_first_offered(&[path], &ValidationPolicy::default())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(candidate.name, "talk.mp3");
        assert_eq!(candidate.mime_type, "audio/mpeg");
        assert_eq!(candidate.bytes.len(), MP3_ID3.len());
    }

    #[tokio::test]
    async fn test_files_after_the_first_are_not_touched() {
        let dir = tempfile::tempdir().unwrap();
        let first = write_file(dir.path(), "talk.mp3", MP3_ID3);
        let oversized = write_file(dir.path(), "big.mp3", &[0u8; 64]);
        let missing = dir.path().join("missing.mp3");
        let policy = ValidationPolicy::new(["audio/mpeg"], 32);

        let candidate = read_first_offered(&[first, oversized, missing], &policy)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(candidate.name, "talk.mp3");
    }

    #[tokio::test]
    async fn test_oversized_first_file_rejected_before_reading() {
        let dir = tempfile::tempdir().unwrap();
        let big = write_file(dir.path(), "big.mp3", &[0u8; 64]);
        let policy = ValidationPolicy::new(["audio/mpeg"], 32);

        let err = read_first_offered(&[big], &policy).await.unwrap_err();
        assert!(matches!(
            err,
            OfferError::Rejected(ValidationError::TooLarge {
                size_bytes: 64,
                max_size_bytes: 32
            })
        ));
    }

    #[tokio::test]
    async fn test_missing_first_file_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.mp3");
        let ok = write_file(dir.path(), "talk.mp3", MP3_ID3);

        let err = read_first_offered(&[missing, ok], &ValidationPolicy::default())
            .await
            .unwrap_err();
        assert!(matches!(err, OfferError::Read { .. }));
        assert!(err.to_string().contains("missing.mp3"));
    }

    #[tokio::test]
    async fn test_nothing_offered() {
        let offered = read_first_offered(&[], &ValidationPolicy::default()).await.unwrap();
        assert!(offered.is_none());
    }
}
