pub mod facemesh_extension;
pub mod reporter;
