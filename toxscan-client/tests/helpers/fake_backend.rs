use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use toxscan_common::{AnalysisBackend, AnalysisResponse, MediaAsset, RelayError};

/// `{ full_transcript: "Hi", sentences: [{ text: "Hi", start: 0, end: 1 }] }`
pub fn sample_response() -> AnalysisResponse {
    AnalysisResponse::from_value(&json!({
        "full_transcript": "Hi",
        "sentences": [{"text": "Hi", "start": 0, "end": 1}]
    }))
    .expect("valid sample")
}

/// Backend answering every call with the same scripted result
pub struct FakeBackend {
    result: Result<AnalysisResponse, RelayError>,
    delay: Duration,
    calls: AtomicUsize,
    active: Arc<AtomicUsize>,
    max_active: AtomicUsize,
    last_asset: std::sync::Mutex<Option<String>>,
}

impl FakeBackend {
    pub fn succeeding() -> Arc<Self> {
        Self::with_result(Ok(sample_response()), Duration::ZERO)
    }

    pub fn failing(error: RelayError) -> Arc<Self> {
        Self::with_result(Err(error), Duration::ZERO)
    }

    pub fn with_result(result: Result<AnalysisResponse, RelayError>, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            result,
            delay,
            calls: AtomicUsize::new(0),
            active: Arc::new(AtomicUsize::new(0)),
            max_active: AtomicUsize::new(0),
            last_asset: std::sync::Mutex::new(None),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Most calls ever running at the same time
    pub fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    pub fn last_asset(&self) -> Option<String> {
        self.last_asset.lock().unwrap().clone()
    }
}

#[async_trait]
impl AnalysisBackend for FakeBackend {
    async fn analyze(&self, asset: &MediaAsset) -> Result<AnalysisResponse, RelayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let _active = ActiveCall::enter(&self.active);
        self.max_active
            .fetch_max(self.active.load(Ordering::SeqCst), Ordering::SeqCst);
        *self.last_asset.lock().unwrap() = Some(asset.name().to_string());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.result.clone()
    }
}

/// Counts a running call until dropped, including when the call is cancelled
struct ActiveCall(Arc<AtomicUsize>);

impl ActiveCall {
    fn enter(active: &Arc<AtomicUsize>) -> Self {
        active.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(active))
    }
}

impl Drop for ActiveCall {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}
