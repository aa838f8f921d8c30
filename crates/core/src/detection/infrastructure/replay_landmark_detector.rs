use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::detection::domain::face_mesh::DetectionBatch;
use crate::detection::domain::landmark_detector::{DetectError, LandmarkDetector};
use crate::shared::frame::Frame;

#[derive(Error, Debug)]
pub enum RecordingError {
    #[error("failed to read recording {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid recording: {0}")]
    Parse(#[from] serde_json::Error),
}

/// A captured detection stream: one batch per frame, in frame order.
///
/// JSON shape: `[[face, ...], ...]` where each face is `[[x, y, z], ...]`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Recording {
    batches: Vec<DetectionBatch>,
}

impl Recording {
    pub fn new(batches: Vec<DetectionBatch>) -> Self {
        Self { batches }
    }

    pub fn load(path: &Path) -> Result<Self, RecordingError> {
        let json = fs::read_to_string(path).map_err(|source| RecordingError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    pub fn from_json(json: &str) -> Result<Self, RecordingError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn batches(&self) -> &[DetectionBatch] {
        &self.batches
    }

    pub fn len(&self) -> usize {
        self.batches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }
}

/// Replays a [`Recording`] by frame index.
///
/// Stands in for a live model when driving the extension from captured
/// data. Frames past the end of the recording see no faces.
pub struct ReplayLandmarkDetector {
    recording: Arc<Recording>,
}

impl ReplayLandmarkDetector {
    pub fn new(recording: Arc<Recording>) -> Self {
        Self { recording }
    }
}

impl LandmarkDetector for ReplayLandmarkDetector {
    fn predict(&mut self, frame: &Frame) -> Result<DetectionBatch, DetectError> {
        Ok(self
            .recording
            .batches
            .get(frame.index())
            .cloned()
            .unwrap_or_default())
    }
}
