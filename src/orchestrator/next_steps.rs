use serde::{Deserialize, Serialize};

use crate::gates::gate_spec;
use crate::models::project::ArtifactSlot;
use crate::models::roles::Role;
use crate::models::state::{ProjectState, StoryState};

/// One candidate move offered to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NextStep {
    pub action: String,
    pub description: String,
    pub role: Option<Role>,
    pub estimated_effort: String,
    /// Prerequisites for a project step, quality requirements for a story step.
    pub requirements: Vec<String>,
}

pub fn project_next_steps(state: ProjectState) -> Vec<NextStep> {
    state
        .valid_transitions()
        .iter()
        .map(|next| NextStep {
            action: format!("advance_to_{next}"),
            description: format!("Move project to {next} phase"),
            role: next.responsible_role(),
            estimated_effort: next.estimated_effort().to_string(),
            requirements: ArtifactSlot::prerequisite_hints(*next)
                .iter()
                .map(|h| h.to_string())
                .collect(),
        })
        .collect()
}

pub fn story_next_steps(state: StoryState) -> Vec<NextStep> {
    state
        .valid_transitions()
        .iter()
        .map(|next| NextStep {
            action: format!("advance_story_to_{next}"),
            description: format!("Move story to {next}"),
            role: next.responsible_role(),
            estimated_effort: next.estimated_effort().to_string(),
            requirements: gate_spec(*next)
                .required
                .iter()
                .map(|c| c.name().to_string())
                .collect(),
        })
        .collect()
}
