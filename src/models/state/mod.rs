mod transitions;
mod types;

pub use types::{ProjectState, StoryState, WorkflowPhase};

#[cfg(test)]
mod tests;
