//! Face-mesh landmark tracking for block-programming hosts.
//!
//! A [`feed::detection_feed::DetectionFeed`] runs a landmark detector
//! against the host's video and posts each batch of faces to a
//! [`tracking::face_store::FaceStore`]; [`query::face_query::FaceQuery`]
//! answers coordinate and count reporters from the latest batch.
//! [`extension::facemesh_extension::Facemesh2Scratch`] ties them together
//! behind the block surface.

pub mod detection;
pub mod extension;
pub mod feed;
pub mod query;
pub mod shared;
pub mod tracking;
pub mod video;
