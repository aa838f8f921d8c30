use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use crate::video::domain::frame_source::{share, FrameSource, SharedFrameSource, SourceError};
use crate::video::domain::video_provider::VideoProvider;

pub type SourceFactory = Box<dyn Fn() -> Result<Box<dyn FrameSource>, SourceError> + Send + Sync>;

/// In-process [`VideoProvider`] that opens sources through a factory.
///
/// The opened source is kept while video is enabled and handed out by
/// reference on every `enable_video`; `disable_video` releases it. Mirrored
/// by default, like a selfie camera.
pub struct LocalVideoProvider {
    open: SourceFactory,
    source: Mutex<Option<SharedFrameSource>>,
    mirror: AtomicBool,
    acquisitions: AtomicUsize,
}

impl LocalVideoProvider {
    pub fn new(open: SourceFactory) -> Self {
        Self {
            open,
            source: Mutex::new(None),
            mirror: AtomicBool::new(true),
            acquisitions: AtomicUsize::new(0),
        }
    }

    /// How many times the underlying source has been opened.
    pub fn acquisitions(&self) -> usize {
        self.acquisitions.load(Ordering::SeqCst)
    }

    pub fn is_enabled(&self) -> bool {
        self.source
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

impl VideoProvider for LocalVideoProvider {
    fn enable_video(&self) -> Result<SharedFrameSource, SourceError> {
        let mut slot = self.source.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(source) = slot.as_ref() {
            return Ok(source.clone());
        }
        let source = share((self.open)()?);
        self.acquisitions.fetch_add(1, Ordering::SeqCst);
        *slot = Some(source.clone());
        Ok(source)
    }

    fn disable_video(&self) {
        self.source
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }

    fn mirror(&self) -> bool {
        self.mirror.load(Ordering::SeqCst)
    }

    fn set_mirror(&self, mirror: bool) {
        self.mirror.store(mirror, Ordering::SeqCst);
    }
}
