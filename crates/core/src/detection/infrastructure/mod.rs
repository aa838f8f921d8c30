pub mod interval_detector;
pub mod replay_landmark_detector;
