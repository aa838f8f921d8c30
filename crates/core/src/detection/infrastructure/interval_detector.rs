use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::detection::domain::face_mesh::DetectionBatch;
use crate::detection::domain::landmark_detector::{DetectError, LandmarkDetector};
use crate::shared::frame::Frame;

/// Minimum time between model predictions, shared between the extension
/// (writer) and running detectors (readers).
#[derive(Clone, Debug, Default)]
pub struct DetectionInterval {
    millis: Arc<AtomicU64>,
}

impl DetectionInterval {
    pub fn new(interval: Duration) -> Self {
        let this = Self::default();
        this.set(interval);
        this
    }

    pub fn get(&self) -> Duration {
        Duration::from_millis(self.millis.load(Ordering::Relaxed))
    }

    pub fn set(&self, interval: Duration) {
        let millis = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        self.millis.store(millis, Ordering::Relaxed);
    }
}

/// Decorator that predicts at most once per [`DetectionInterval`],
/// re-emitting the last batch on frames in between.
///
/// A zero interval delegates on every frame.
pub struct IntervalDetector {
    inner: Box<dyn LandmarkDetector>,
    interval: DetectionInterval,
    last_batch: DetectionBatch,
    last_predict: Option<Instant>,
}

impl IntervalDetector {
    pub fn new(inner: Box<dyn LandmarkDetector>, interval: DetectionInterval) -> Self {
        Self {
            inner,
            interval,
            last_batch: Vec::new(),
            last_predict: None,
        }
    }

    fn is_due(&self, now: Instant) -> bool {
        match self.last_predict {
            None => true,
            Some(at) => now.duration_since(at) >= self.interval.get(),
        }
    }
}

impl LandmarkDetector for IntervalDetector {
    fn predict(&mut self, frame: &Frame) -> Result<DetectionBatch, DetectError> {
        let now = Instant::now();
        if self.is_due(now) {
            self.last_batch = self.inner.predict(frame)?;
            self.last_predict = Some(now);
        }
        Ok(self.last_batch.clone())
    }
}
