pub mod arguments;
pub mod face_query;
pub mod view_transform;
