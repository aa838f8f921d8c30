//! Face-mesh landmark types shared by detectors, the face store and queries.
//!
//! Coordinates are in model space (pixels of the frame the model saw).
//! Keypoint order follows the model's mesh topology and is stable across
//! frames; face order is positional only.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
#[error("keypoint needs at least x and y, got {0} values")]
pub struct KeypointError(pub usize);

/// One landmark. Serialised as `[x, y]` or `[x, y, z]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct Keypoint {
    pub x: f64,
    pub y: f64,
    /// Depth; 0.0 for 2D models.
    pub z: f64,
}

impl Keypoint {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn planar(x: f64, y: f64) -> Self {
        Self::new(x, y, 0.0)
    }
}

impl TryFrom<Vec<f64>> for Keypoint {
    type Error = KeypointError;

    fn try_from(values: Vec<f64>) -> Result<Self, Self::Error> {
        match values.as_slice() {
            [x, y] => Ok(Self::planar(*x, *y)),
            [x, y, z, ..] => Ok(Self::new(*x, *y, *z)),
            _ => Err(KeypointError(values.len())),
        }
    }
}

impl From<Keypoint> for Vec<f64> {
    fn from(k: Keypoint) -> Self {
        vec![k.x, k.y, k.z]
    }
}

/// Landmarks of one face as emitted by a detector for a single frame.
pub type RawFace = Vec<Keypoint>;

/// One event's worth of detections, in detector order.
pub type DetectionBatch = Vec<RawFace>;

/// One entry of the tracked face list. Replaced wholesale on every batch.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TrackedFace {
    keypoints: Vec<Keypoint>,
}

impl TrackedFace {
    pub fn new(keypoints: Vec<Keypoint>) -> Self {
        Self { keypoints }
    }

    pub fn keypoints(&self) -> &[Keypoint] {
        &self.keypoints
    }

    /// 0-based lookup; `None` past the end of the mesh.
    pub fn keypoint(&self, index: usize) -> Option<&Keypoint> {
        self.keypoints.get(index)
    }
}

impl From<RawFace> for TrackedFace {
    fn from(keypoints: RawFace) -> Self {
        Self::new(keypoints)
    }
}
