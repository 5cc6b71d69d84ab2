use serde::{Deserialize, Serialize};
use tracing::info;

use super::next_steps::{project_next_steps, NextStep};
use super::Orchestrator;
use crate::error::{EntityKind, Result, WorkflowError};
use crate::gates::GateVerdict;
use crate::models::project::{ArtifactSlot, ProjectContext};
use crate::models::session::WorkflowSession;
use crate::models::state::ProjectState;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectCreated {
    pub project_id: String,
    pub session_id: String,
    pub state: ProjectState,
    pub next_states: Vec<ProjectState>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectAdvance {
    pub project_id: String,
    pub from: ProjectState,
    pub to: ProjectState,
    pub verdict: GateVerdict,
    pub next_steps: Vec<NextStep>,
}

impl Orchestrator {
    pub fn create_project(&mut self, name: &str, idea: Option<&str>) -> ProjectCreated {
        let project = ProjectContext::new(
            ProjectContext::generate_id(),
            name.to_string(),
            idea.map(str::to_string),
        );
        let session = WorkflowSession::new(&project);

        let created = ProjectCreated {
            project_id: project.id.clone(),
            session_id: session.id.clone(),
            state: project.state,
            next_states: project.state.valid_transitions().to_vec(),
        };

        info!(project_id = %project.id, name, "Project created");
        self.register_project(project, session);
        self.metrics.projects_created += 1;
        created
    }

    /// Advance a project: legality, then artifact prerequisites, then the
    /// project gate. Nothing is mutated unless all three pass.
    pub fn advance_project_state(
        &mut self,
        project_id: &str,
        target: Option<ProjectState>,
    ) -> Result<ProjectAdvance> {
        let project = self
            .active_projects
            .get_mut(project_id)
            .ok_or_else(|| WorkflowError::not_found(EntityKind::Project, project_id))?;
        let from = project.state;
        let to = from.resolve_target(target)?;

        let missing = project.missing_prerequisites(to);
        if !missing.is_empty() {
            return Err(WorkflowError::PrerequisiteUnmet {
                target: to.to_string(),
                recommendations: missing
                    .iter()
                    .map(|slot| format!("Populate the {slot} artifact before entering {to}"))
                    .collect(),
                missing,
            });
        }

        // the gate record is kept even when the verdict rejects the move
        let verdict = self.gates.check_project_gates(project, to).into_result()?;

        project.update_state(to);
        self.session_mut(project_id)?.project_moved(to);
        self.metrics.project_transitions += 1;
        info!(project_id, from = %from, to = %to, "Project advanced");

        Ok(ProjectAdvance {
            project_id: project_id.to_string(),
            from,
            to,
            verdict,
            next_steps: project_next_steps(to),
        })
    }

    /// Fill an artifact slot on behalf of external role logic.
    pub fn set_project_artifact(
        &mut self,
        project_id: &str,
        slot: ArtifactSlot,
        value: impl Into<String>,
    ) -> Result<()> {
        let project = self.project_mut(project_id)?;
        project.set_artifact(slot, value.into());
        info!(project_id, slot = %slot, "Artifact recorded");
        Ok(())
    }
}
