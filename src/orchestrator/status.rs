use serde::{Deserialize, Serialize};

use super::next_steps::{project_next_steps, NextStep};
use super::Orchestrator;
use crate::error::{EntityKind, Result, WorkflowError};
use crate::models::roles::Role;
use crate::models::session::WorkflowSession;
use crate::models::state::{ProjectState, StoryState};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorySummary {
    pub story_id: String,
    pub title: String,
    pub state: StoryState,
    pub responsible_role: Option<Role>,
    pub certified: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectSummary {
    pub project_id: String,
    pub name: String,
    pub state: ProjectState,
    pub total_stories: usize,
    pub completed_stories: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectStatus {
    pub project: ProjectSummary,
    pub responsible_role: Option<Role>,
    pub stories: Vec<StorySummary>,
    pub session: Option<WorkflowSession>,
    pub next_steps: Vec<NextStep>,
}

/// Read-only projection returned by [`Orchestrator::get_workflow_status`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum WorkflowStatus {
    Project(Box<ProjectStatus>),
    All { projects: Vec<ProjectSummary> },
}

impl Orchestrator {
    /// Status of one project, or a summary of every project when `None`.
    pub fn get_workflow_status(&self, project_id: Option<&str>) -> Result<WorkflowStatus> {
        let Some(project_id) = project_id else {
            let projects = self
                .project_ids()
                .filter_map(|id| self.project_summary(id))
                .collect();
            return Ok(WorkflowStatus::All { projects });
        };

        let project = self
            .project(project_id)
            .ok_or_else(|| WorkflowError::not_found(EntityKind::Project, project_id))?;
        let summary = self
            .project_summary(project_id)
            .ok_or_else(|| WorkflowError::not_found(EntityKind::Project, project_id))?;

        let stories = self
            .stories_for(project_id)
            .into_iter()
            .map(|s| StorySummary {
                story_id: s.id.clone(),
                title: s.title.clone(),
                state: s.state,
                responsible_role: s.state.responsible_role(),
                certified: s.certificate.is_some(),
            })
            .collect();

        Ok(WorkflowStatus::Project(Box::new(ProjectStatus {
            project: summary,
            responsible_role: project.state.responsible_role(),
            stories,
            session: self.session_for(project_id).cloned(),
            next_steps: project_next_steps(project.state),
        })))
    }

    fn project_summary(&self, project_id: &str) -> Option<ProjectSummary> {
        self.project(project_id).map(|p| ProjectSummary {
            project_id: p.id.clone(),
            name: p.name.clone(),
            state: p.state,
            total_stories: p.stories.len(),
            completed_stories: p.completed_stories,
        })
    }
}
