use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use toxscan_client::{CaptureDevice, CaptureError, OpenedStream, PcmFormat, StreamHandle};

pub const MONO_16K: PcmFormat = PcmFormat {
    sample_rate: 16_000,
    channels: 1,
};

/// Capture device that replays a fixed list of fragments.
///
/// The fragment channel stays open until the stream is released, like a live
/// microphone.
pub struct FakeMicrophone {
    fragments: Vec<Vec<u8>>,
    refuse: Option<CaptureError>,
    opens: Arc<AtomicUsize>,
    releases: Arc<AtomicUsize>,
}

impl FakeMicrophone {
    pub fn new(fragments: Vec<Vec<u8>>) -> Self {
        Self {
            fragments,
            refuse: None,
            opens: Arc::new(AtomicUsize::new(0)),
            releases: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Device whose `open` always fails with `error`
    pub fn refusing(error: CaptureError) -> Self {
        Self {
            refuse: Some(error),
            ..Self::new(Vec::new())
        }
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }
}

struct FakeHandle {
    sender: Option<mpsc::Sender<Vec<u8>>>,
    releases: Arc<AtomicUsize>,
}

impl StreamHandle for FakeHandle {
    fn release(&mut self) {
        self.sender.take();
        self.releases.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl CaptureDevice for FakeMicrophone {
    async fn open(&self) -> Result<OpenedStream, CaptureError> {
        if let Some(error) = &self.refuse {
            return Err(error.clone());
        }
        self.opens.fetch_add(1, Ordering::SeqCst);

        let (tx, rx) = mpsc::channel(self.fragments.len().max(1));
        for fragment in &self.fragments {
            tx.send(fragment.clone()).await.expect("fragment queue open");
        }

        Ok(OpenedStream {
            handle: Box::new(FakeHandle {
                sender: Some(tx),
                releases: Arc::clone(&self.releases),
            }),
            fragments: rx,
            format: MONO_16K,
        })
    }
}
