use crate::detection::domain::face_mesh::DetectionBatch;
use crate::shared::frame::Frame;

pub type DetectError = Box<dyn std::error::Error + Send + Sync>;

/// Domain interface for a face-landmark model.
///
/// Called once per frame from the feed's producer thread. Implementations
/// may keep state between frames, hence `&mut self`.
pub trait LandmarkDetector: Send {
    fn predict(&mut self, frame: &Frame) -> Result<DetectionBatch, DetectError>;
}

/// Builds a detector for a new feed session.
///
/// Construction is allowed to be slow (model download, weight upload) and
/// runs off the caller's thread.
pub trait LandmarkDetectorFactory: Send + Sync {
    fn create(&self) -> Result<Box<dyn LandmarkDetector>, DetectError>;
}

impl<F> LandmarkDetectorFactory for F
where
    F: Fn() -> Result<Box<dyn LandmarkDetector>, DetectError> + Send + Sync,
{
    fn create(&self) -> Result<Box<dyn LandmarkDetector>, DetectError> {
        self()
    }
}
