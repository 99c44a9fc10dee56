//! Recording container: interleaved PCM16 LE fragments packaged as WAV

use std::io::Cursor;

use crate::error::CaptureError;
use crate::recording::PcmFormat;

/// MIME type of every finalized recording
pub const WAV_MIME_TYPE: &str = "audio/wav";

/// Concatenate `fragments` in order and wrap them in a WAV container.
///
/// Fragments may split a sample across their boundaries; only the total must
/// be a whole number of frames.
pub fn encode_pcm16(fragments: &[Vec<u8>], format: PcmFormat) -> Result<Vec<u8>, CaptureError> {
    if format.channels == 0 || format.sample_rate == 0 {
        return Err(CaptureError::Finalization(format!(
            "invalid capture format: {} ch @ {} Hz",
            format.channels, format.sample_rate
        )));
    }

    let total: usize = fragments.iter().map(Vec::len).sum();
    let frame_bytes = 2 * format.channels as usize;
    if total % frame_bytes != 0 {
        return Err(CaptureError::Finalization(format!(
            "{} captured bytes are not a whole number of {}-byte frames",
            total, frame_bytes
        )));
    }

    let spec = hound::WavSpec {
        channels: format.channels,
        sample_rate: format.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::with_capacity(total + 44));
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).map_err(finalization)?;
        let mut bytes = fragments.iter().flatten().copied();
        while let (Some(lo), Some(hi)) = (bytes.next(), bytes.next()) {
            writer
                .write_sample(i16::from_le_bytes([lo, hi]))
                .map_err(finalization)?;
        }
        writer.finalize().map_err(finalization)?;
    }

    Ok(cursor.into_inner())
}

fn finalization(err: hound::Error) -> CaptureError {
    CaptureError::Finalization(err.to_string())
}
