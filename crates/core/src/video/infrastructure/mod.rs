pub mod blank_frame_source;
pub mod image_frame_source;
pub mod local_video_provider;
