pub mod common;
pub mod quality;
pub mod status;
pub mod story;
pub mod workflow;
