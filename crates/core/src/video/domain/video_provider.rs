use crate::video::domain::frame_source::{SharedFrameSource, SourceError};

/// The host runtime's video device.
///
/// `enable_video` may block while the camera starts; callers run it off
/// their own thread. Repeated calls while enabled hand back the same
/// source.
pub trait VideoProvider: Send + Sync {
    fn enable_video(&self) -> Result<SharedFrameSource, SourceError>;

    fn disable_video(&self);

    /// Whether the host displays video mirrored (selfie view).
    fn mirror(&self) -> bool;

    fn set_mirror(&self, mirror: bool);
}
