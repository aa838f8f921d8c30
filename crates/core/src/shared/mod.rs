pub mod config;
pub mod constants;
pub mod frame;
pub mod messages;
