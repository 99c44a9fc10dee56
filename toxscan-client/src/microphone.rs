//! cpal-backed microphone
//!
//! `cpal::Stream` is not `Send`, so every capture owns a dedicated thread that
//! builds the stream, keeps it alive, and drops it when the handle is
//! released. Samples are converted to PCM16 LE in the audio callback and
//! forwarded as fragments.

use std::sync::mpsc as std_mpsc;
use std::thread;

use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BuildStreamError, Device, PlayStreamError, SampleFormat, Stream, StreamConfig};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};
use tracing::{error, info, warn};

use crate::error::CaptureError;
use crate::recording::{CaptureDevice, OpenedStream, PcmFormat, StreamHandle};

/// Fragments buffered between the audio callback and the session
const FRAGMENT_QUEUE: usize = 256;

/// Default input device, or a named one
#[derive(Debug, Clone, Default)]
pub struct Microphone {
    device_name: Option<String>,
}

impl Microphone {
    pub fn new(device_name: Option<String>) -> Self {
        Self { device_name }
    }
}

#[async_trait]
impl CaptureDevice for Microphone {
    async fn open(&self) -> Result<OpenedStream, CaptureError> {
        let (fragment_tx, fragment_rx) = mpsc::channel(FRAGMENT_QUEUE);
        let (ready_tx, ready_rx) = oneshot::channel();
        let (stop_tx, stop_rx) = std_mpsc::channel::<()>();
        let device_name = self.device_name.clone();

        thread::Builder::new()
            .name("toxscan-capture".to_string())
            .spawn(move || {
                let stream = match open_stream(device_name.as_deref(), fragment_tx) {
                    Ok((stream, format)) => {
                        let _ = ready_tx.send(Ok(format));
                        stream
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                // Returns on release or when the handle is dropped
                let _ = stop_rx.recv();
                drop(stream);
                info!("Microphone stream closed");
            })
            .map_err(|e| CaptureError::DeviceUnavailable(e.to_string()))?;

        let format = ready_rx.await.map_err(|_| {
            CaptureError::DeviceUnavailable("capture thread exited during setup".to_string())
        })??;

        Ok(OpenedStream {
            handle: Box::new(MicrophoneHandle {
                stop: Some(stop_tx),
            }),
            fragments: fragment_rx,
            format,
        })
    }
}

struct MicrophoneHandle {
    stop: Option<std_mpsc::Sender<()>>,
}

impl StreamHandle for MicrophoneHandle {
    fn release(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
    }
}

fn find_device(name: Option<&str>) -> Result<Device, CaptureError> {
    let host = cpal::default_host();
    match name {
        None => host
            .default_input_device()
            .ok_or_else(|| CaptureError::DeviceUnavailable("no default input device".to_string())),
        Some(wanted) => host
            .input_devices()
            .map_err(|e| CaptureError::DeviceUnavailable(e.to_string()))?
            .find(|d| d.name().map(|n| n == wanted).unwrap_or(false))
            .ok_or_else(|| {
                CaptureError::DeviceUnavailable(format!("input device '{}' not found", wanted))
            }),
    }
}

fn open_stream(
    device_name: Option<&str>,
    fragments: mpsc::Sender<Vec<u8>>,
) -> Result<(Stream, PcmFormat), CaptureError> {
    let device = find_device(device_name)?;
    info!("Using input device: {}", device.name().unwrap_or_default());

    let supported = device
        .default_input_config()
        .map_err(|e| CaptureError::DeviceUnavailable(e.to_string()))?;
    let sample_format = supported.sample_format();
    let config: StreamConfig = supported.into();
    let format = PcmFormat {
        sample_rate: config.sample_rate.0,
        channels: config.channels,
    };

    let stream = match sample_format {
        SampleFormat::I16 => build_stream::<i16>(&device, &config, fragments),
        SampleFormat::U16 => build_stream::<u16>(&device, &config, fragments),
        SampleFormat::I32 => build_stream::<i32>(&device, &config, fragments),
        SampleFormat::F32 => build_stream::<f32>(&device, &config, fragments),
        other => {
            return Err(CaptureError::DeviceUnavailable(format!(
                "unsupported sample format {:?}",
                other
            )))
        }
    }
    .map_err(build_error)?;

    stream.play().map_err(play_error)?;
    Ok((stream, format))
}

fn build_stream<T>(
    device: &Device,
    config: &StreamConfig,
    fragments: mpsc::Sender<Vec<u8>>,
) -> Result<Stream, BuildStreamError>
where
    T: cpal::SizedSample + Send + 'static,
    i16: cpal::FromSample<T>,
{
    device.build_input_stream(
        config,
        move |data: &[T], _: &cpal::InputCallbackInfo| {
            let mut fragment = Vec::with_capacity(data.len() * 2);
            for &sample in data {
                let pcm: i16 = cpal::Sample::from_sample(sample);
                fragment.extend_from_slice(&pcm.to_le_bytes());
            }
            if let Err(TrySendError::Full(_)) = fragments.try_send(fragment) {
                warn!("Capture fragment dropped: session not keeping up");
            }
        },
        |err| error!("Microphone stream error: {}", err),
        None,
    )
}

fn build_error(err: BuildStreamError) -> CaptureError {
    match err {
        BuildStreamError::DeviceNotAvailable => {
            CaptureError::DeviceUnavailable("input device disappeared".to_string())
        }
        other => CaptureError::PermissionDenied(other.to_string()),
    }
}

fn play_error(err: PlayStreamError) -> CaptureError {
    match err {
        PlayStreamError::DeviceNotAvailable => {
            CaptureError::DeviceUnavailable("input device disappeared".to_string())
        }
        other => CaptureError::PermissionDenied(other.to_string()),
    }
}
