use std::thread;
use std::time::{Duration, Instant};

use crate::shared::frame::Frame;
use crate::video::domain::frame_source::{FrameSource, SourceError};

/// Sleeps so consecutive frames are at least one period apart.
#[derive(Debug)]
pub(crate) struct Pacer {
    period: Option<Duration>,
    last: Option<Instant>,
}

impl Pacer {
    pub(crate) fn new(fps: Option<u32>) -> Self {
        Self {
            period: fps
                .filter(|&f| f > 0)
                .map(|f| Duration::from_secs_f64(1.0 / f as f64)),
            last: None,
        }
    }

    pub(crate) fn wait(&mut self) {
        if let (Some(period), Some(last)) = (self.period, self.last) {
            let elapsed = last.elapsed();
            if elapsed < period {
                thread::sleep(period - elapsed);
            }
        }
        self.last = Some(Instant::now());
    }
}

/// Synthetic camera producing black frames.
///
/// Useful when the detector ignores pixels (replayed detections). With a
/// `limit` the stream ends after that many frames.
pub struct BlankFrameSource {
    width: u32,
    height: u32,
    limit: Option<usize>,
    next_index: usize,
    pacer: Pacer,
}

impl BlankFrameSource {
    pub fn new(width: u32, height: u32, fps: Option<u32>, limit: Option<usize>) -> Self {
        Self {
            width,
            height,
            limit,
            next_index: 0,
            pacer: Pacer::new(fps),
        }
    }
}

impl FrameSource for BlankFrameSource {
    fn next_frame(&mut self) -> Option<Result<Frame, SourceError>> {
        if self.limit.is_some_and(|limit| self.next_index >= limit) {
            return None;
        }
        self.pacer.wait();
        let frame = Frame::blank(self.width, self.height, self.next_index);
        self.next_index += 1;
        Some(Ok(frame))
    }
}
