//! Live capture sessions
//!
//! A [`RecordingSession`] exists only while recording: creating one acquires
//! the capture stream, [`RecordingSession::stop`] consumes it and yields the
//! packaged recording. The stream sits in a [`StreamGuard`], so it is released
//! on every exit path (normal stop, failed finalization, or the session being
//! dropped mid-capture).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local};
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use toxscan_common::CandidateFile;

use crate::error::CaptureError;
use crate::wav::{self, WAV_MIME_TYPE};

/// Default elapsed-time tick
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Upper bound on waiting for in-transit fragments after the stream is released
const DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Shape of the interleaved PCM16 LE fragments a device delivers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcmFormat {
    pub sample_rate: u32,
    pub channels: u16,
}

/// Platform handle keeping a capture stream alive
pub trait StreamHandle: Send {
    /// Stop capturing and give the hardware back. Called at most once.
    fn release(&mut self);
}

/// A capture stream that has been acquired and is delivering fragments.
///
/// The fragment channel closes once the stream is released.
pub struct OpenedStream {
    pub handle: Box<dyn StreamHandle>,
    pub fragments: mpsc::Receiver<Vec<u8>>,
    pub format: PcmFormat,
}

/// Source of live audio (microphone, test double)
#[async_trait]
pub trait CaptureDevice: Send + Sync {
    async fn open(&self) -> Result<OpenedStream, CaptureError>;
}

/// Releases the wrapped stream exactly once, at the latest on drop
pub struct StreamGuard {
    handle: Option<Box<dyn StreamHandle>>,
}

impl StreamGuard {
    pub fn new(handle: Box<dyn StreamHandle>) -> Self {
        Self {
            handle: Some(handle),
        }
    }

    pub fn release(&mut self) {
        if let Some(mut handle) = self.handle.take() {
            handle.release();
            debug!("Capture stream released");
        }
    }

    pub fn is_held(&self) -> bool {
        self.handle.is_some()
    }
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        self.release();
    }
}

/// One active recording
pub struct RecordingSession {
    started_at: DateTime<Local>,
    format: PcmFormat,
    stream: StreamGuard,
    fragments: Arc<Mutex<Vec<Vec<u8>>>>,
    elapsed: watch::Receiver<u64>,
    ticker: CancellationToken,
    timer_task: Option<JoinHandle<()>>,
    pump_task: Option<JoinHandle<()>>,
}

impl RecordingSession {
    /// Acquire the device's stream and begin capturing.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn start(
        device: &dyn CaptureDevice,
        tick_interval: Duration,
    ) -> Result<Self, CaptureError> {
        let opened = device.open().await?;
        let stream = StreamGuard::new(opened.handle);

        let fragments = Arc::new(Mutex::new(Vec::new()));
        let pump_task = tokio::spawn(pump_fragments(opened.fragments, Arc::clone(&fragments)));

        let ticker = CancellationToken::new();
        let (elapsed_tx, elapsed) = watch::channel(0u64);
        let timer_task = tokio::spawn(run_timer(elapsed_tx, tick_interval, ticker.clone()));

        info!(
            "Recording started ({} Hz, {} ch)",
            opened.format.sample_rate, opened.format.channels
        );

        Ok(Self {
            started_at: Local::now(),
            format: opened.format,
            stream,
            fragments,
            elapsed,
            ticker,
            timer_task: Some(timer_task),
            pump_task: Some(pump_task),
        })
    }

    pub fn elapsed_seconds(&self) -> u64 {
        *self.elapsed.borrow()
    }

    /// Receiver that observes every elapsed-time tick
    pub fn subscribe_elapsed(&self) -> watch::Receiver<u64> {
        self.elapsed.clone()
    }

    pub fn format(&self) -> PcmFormat {
        self.format
    }

    /// `recording-YYYYMMDD-HHMMSS.wav`, local capture start time
    pub fn file_name(&self) -> String {
        format!("recording-{}.wav", self.started_at.format("%Y%m%d-%H%M%S"))
    }

    /// Stop capturing and package the fragments received so far.
    ///
    /// The stream is released before packaging starts, so a finalization
    /// failure still leaves the hardware free.
    pub async fn stop(mut self) -> Result<CandidateFile, CaptureError> {
        self.ticker.cancel();
        if let Some(timer) = self.timer_task.take() {
            let _ = timer.await;
        }

        self.stream.release();
        self.drain().await;

        let fragments = std::mem::take(&mut *self.fragments.lock().await);
        let elapsed = self.elapsed_seconds();
        let bytes = wav::encode_pcm16(&fragments, self.format)?;

        info!(
            "Recording stopped after {}s: {} fragments, {} bytes",
            elapsed,
            fragments.len(),
            bytes.len()
        );
        Ok(CandidateFile::new(self.file_name(), WAV_MIME_TYPE, bytes))
    }

    async fn drain(&mut self) {
        let Some(pump) = self.pump_task.take() else {
            return;
        };
        let abort = pump.abort_handle();
        if tokio::time::timeout(DRAIN_TIMEOUT, pump).await.is_err() {
            warn!("Capture fragments still arriving after release; finalizing without them");
            abort.abort();
        }
    }
}

impl Drop for RecordingSession {
    fn drop(&mut self) {
        self.ticker.cancel();
        if let Some(pump) = self.pump_task.take() {
            pump.abort();
        }
        // StreamGuard releases the stream
    }
}

async fn pump_fragments(mut source: mpsc::Receiver<Vec<u8>>, sink: Arc<Mutex<Vec<Vec<u8>>>>) {
    while let Some(fragment) = source.recv().await {
        if fragment.is_empty() {
            continue;
        }
        sink.lock().await.push(fragment);
    }
}

async fn run_timer(elapsed: watch::Sender<u64>, tick: Duration, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(tick);
    // First tick completes immediately
    interval.tick().await;
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = interval.tick() => elapsed.send_modify(|seconds| *seconds += 1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const MONO: PcmFormat = PcmFormat {
        sample_rate: 8_000,
        channels: 1,
    };

    struct CountingHandle(Arc<AtomicUsize>);

    impl StreamHandle for CountingHandle {
        fn release(&mut self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct ScriptedDevice {
        fragments: Vec<Vec<u8>>,
        releases: Arc<AtomicUsize>,
    }

    impl ScriptedDevice {
        fn new(fragments: Vec<Vec<u8>>) -> Self {
            Self {
                fragments,
                releases: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    #[async_trait]
    impl CaptureDevice for ScriptedDevice {
        async fn open(&self) -> Result<OpenedStream, CaptureError> {
            let (tx, rx) = mpsc::channel(64);
            for fragment in &self.fragments {
                tx.send(fragment.clone()).await.unwrap();
            }
            Ok(OpenedStream {
                handle: Box::new(CountingHandle(Arc::clone(&self.releases))),
                fragments: rx,
                format: MONO,
            })
        }
    }

    #[tokio::test]
    async fn test_fragments_keep_arrival_order_and_skip_empty() {
        let device = ScriptedDevice::new(vec![vec![1, 0], vec![], vec![2, 0], vec![3, 0]]);
        let session = RecordingSession::start(&device, DEFAULT_TICK_INTERVAL)
            .await
            .unwrap();
        let file = session.stop().await.unwrap();

        assert_eq!(file.mime_type, "audio/wav");
        assert!(file.name.starts_with("recording-") && file.name.ends_with(".wav"));
        assert_eq!(&file.bytes[44..], &[1, 0, 2, 0, 3, 0]);
        assert_eq!(device.releases.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_stream_released_when_finalization_fails() {
        let device = ScriptedDevice::new(vec![vec![1, 2, 3]]);
        let session = RecordingSession::start(&device, DEFAULT_TICK_INTERVAL)
            .await
            .unwrap();

        let result = session.stop().await;
        assert!(matches!(result, Err(CaptureError::Finalization(_))));
        assert_eq!(device.releases.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_dropping_session_releases_stream() {
        let device = ScriptedDevice::new(vec![vec![0, 0]]);
        let session = RecordingSession::start(&device, DEFAULT_TICK_INTERVAL)
            .await
            .unwrap();
        drop(session);
        assert_eq!(device.releases.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_elapsed_ticks_and_stops_with_session() {
        let device = ScriptedDevice::new(vec![]);
        let session = RecordingSession::start(&device, Duration::from_millis(20))
            .await
            .unwrap();
        let elapsed = session.subscribe_elapsed();

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(session.elapsed_seconds() >= 1);

        session.stop().await.unwrap();
        let frozen = *elapsed.borrow();
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(*elapsed.borrow(), frozen);
    }

    #[test]
    fn test_guard_releases_once() {
        let releases = Arc::new(AtomicUsize::new(0));
        let mut guard = StreamGuard::new(Box::new(CountingHandle(Arc::clone(&releases))));
        guard.release();
        guard.release();
        assert!(!guard.is_held());
        drop(guard);
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }
}
