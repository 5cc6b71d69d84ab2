pub mod commands;
pub mod config;
pub mod engine;
pub mod error;
pub mod fs;
pub mod gates;
pub mod models;
pub mod orchestrator;

pub use error::{Result, WorkflowError};
