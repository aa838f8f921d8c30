pub mod detection_feed;
pub mod domain;
