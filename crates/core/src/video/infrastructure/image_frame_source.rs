use std::path::Path;

use crate::shared::frame::Frame;
use crate::video::domain::frame_source::{FrameSource, SourceError};
use crate::video::infrastructure::blank_frame_source::Pacer;

/// Presents a still image as a camera: the same pixels every frame.
///
/// Decoded once with the `image` crate and converted to RGB8.
pub struct ImageFrameSource {
    still: Frame,
    limit: Option<usize>,
    next_index: usize,
    pacer: Pacer,
}

impl ImageFrameSource {
    pub fn open(path: &Path, fps: Option<u32>, limit: Option<usize>) -> Result<Self, SourceError> {
        let rgb = image::open(path)?.to_rgb8();
        let (width, height) = rgb.dimensions();
        Ok(Self::from_frame(
            Frame::new(rgb.into_raw(), width, height, 0),
            fps,
            limit,
        ))
    }

    pub fn from_frame(still: Frame, fps: Option<u32>, limit: Option<usize>) -> Self {
        Self {
            still,
            limit,
            next_index: 0,
            pacer: Pacer::new(fps),
        }
    }
}

impl FrameSource for ImageFrameSource {
    fn next_frame(&mut self) -> Option<Result<Frame, SourceError>> {
        if self.limit.is_some_and(|limit| self.next_index >= limit) {
            return None;
        }
        self.pacer.wait();
        let frame = self.still.with_index(self.next_index);
        self.next_index += 1;
        Some(Ok(frame))
    }
}
