use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::shared::frame::Frame;

pub type SourceError = Box<dyn std::error::Error + Send + Sync>;

/// A stream of camera frames.
///
/// `next_frame` blocks until the next frame is available (sources pace
/// themselves to their frame rate) and returns `None` once the stream has
/// ended.
pub trait FrameSource: Send {
    fn next_frame(&mut self) -> Option<Result<Frame, SourceError>>;
}

/// The host's frame source, shared by reference so a camera is only
/// acquired once no matter how many consumers attach to it.
pub type SharedFrameSource = Arc<Mutex<Box<dyn FrameSource>>>;

pub fn share(source: Box<dyn FrameSource>) -> SharedFrameSource {
    Arc::new(Mutex::new(source))
}

/// Pulls one frame from a shared source, tolerating a poisoned lock.
pub fn pull(source: &SharedFrameSource) -> Option<Result<Frame, SourceError>> {
    source
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .next_frame()
}

/// Detachable reference from a consumer to its frame source.
///
/// Clearing the slot is how a consumer is told to stop: it re-reads the slot
/// before every frame and exits once it finds it empty.
#[derive(Clone, Default)]
pub struct SourceSlot {
    inner: Arc<Mutex<Option<SharedFrameSource>>>,
}

impl SourceSlot {
    pub fn attached(source: SharedFrameSource) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Some(source))),
        }
    }

    pub fn attach(&self, source: SharedFrameSource) {
        *self.lock() = Some(source);
    }

    pub fn get(&self) -> Option<SharedFrameSource> {
        self.lock().clone()
    }

    pub fn detach(&self) {
        self.lock().take();
    }

    pub fn is_attached(&self) -> bool {
        self.lock().is_some()
    }

    fn lock(&self) -> MutexGuard<'_, Option<SharedFrameSource>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
