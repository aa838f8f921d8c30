pub mod frame_source;
pub mod video_provider;
