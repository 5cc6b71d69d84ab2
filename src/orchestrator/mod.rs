//! Orchestrator
//!
//! Sole entry point for creating, advancing and inspecting projects and
//! stories. Before any commit it enforces, in order:
//! - transition legality
//! - artifact prerequisites (project level)
//! - quality gate certification

mod next_steps;
mod projects;
mod registry;
mod routing;
mod status;
mod stories;

pub use next_steps::{project_next_steps, story_next_steps, NextStep};
pub use projects::{ProjectAdvance, ProjectCreated};
pub use registry::{Orchestrator, OrchestratorMetrics};
pub use routing::{Assignment, CommandRoute};
pub use status::{ProjectStatus, ProjectSummary, StorySummary, WorkflowStatus};
pub use stories::{StoryAdvance, StoryCreated};

#[cfg(test)]
mod tests;
