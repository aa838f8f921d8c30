pub mod setup_notifier;
pub mod video_state;
