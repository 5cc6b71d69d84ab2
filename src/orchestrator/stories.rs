use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::next_steps::{story_next_steps, NextStep};
use super::Orchestrator;
use crate::error::{EntityKind, Result, WorkflowError};
use crate::gates::{GateCommand, GateOutcome, GateVerdict};
use crate::models::project::StoryRef;
use crate::models::roles::Role;
use crate::models::session::ActionKind;
use crate::models::state::{ProjectState, StoryState};
use crate::models::story::{StoryContext, StoryUpdate};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryCreated {
    pub story_id: String,
    pub project_id: String,
    pub state: StoryState,
    /// True when creating the story moved the project into development.
    pub project_promoted: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryAdvance {
    pub story_id: String,
    pub project_id: String,
    pub from: StoryState,
    pub to: StoryState,
    pub verdict: GateVerdict,
    pub next_steps: Vec<NextStep>,
}

impl Orchestrator {
    /// Create a story under a project that is ready for development.
    ///
    /// A project in `development_ready` is promoted to `in_development`.
    pub fn create_story(
        &mut self,
        project_id: &str,
        title: &str,
        description: Option<&str>,
        epic_id: Option<&str>,
    ) -> Result<StoryCreated> {
        let project = self.project_mut(project_id)?;

        let project_promoted = match project.state {
            ProjectState::InDevelopment => false,
            ProjectState::DevelopmentReady => {
                let to = project.state.resolve_target(Some(ProjectState::InDevelopment))?;
                project.update_state(to);
                true
            }
            state => {
                return Err(WorkflowError::WrongProjectState {
                    project_id: project_id.to_string(),
                    state: state.to_string(),
                    allowed: vec![
                        ProjectState::DevelopmentReady.to_string(),
                        ProjectState::InDevelopment.to_string(),
                    ],
                })
            }
        };

        let story = StoryContext::new(
            project.next_story_id(),
            project_id.to_string(),
            title.to_string(),
            description.map(str::to_string),
            epic_id.map(str::to_string),
        );
        project.link_story(StoryRef {
            story_id: story.id.clone(),
            title: story.title.clone(),
            state: story.state,
            created_at: story.created_at,
        });

        let session = self.session_mut(project_id)?;
        if project_promoted {
            session.project_moved(ProjectState::InDevelopment);
        }
        session.focus_story(&story.id, story.state);
        if project_promoted {
            self.metrics.project_transitions += 1;
        }

        info!(project_id, story_id = %story.id, project_promoted, "Story created");
        let created = StoryCreated {
            story_id: story.id.clone(),
            project_id: project_id.to_string(),
            state: story.state,
            project_promoted,
        };
        self.register_story(story);
        self.metrics.stories_created += 1;
        Ok(created)
    }

    /// Advance a story. The gate is evaluated first; a failed or blocked
    /// verdict is returned as an error and the story keeps its state.
    pub fn advance_story_state(
        &mut self,
        story_id: &str,
        target: Option<StoryState>,
    ) -> Result<StoryAdvance> {
        let story = self
            .active_stories
            .get_mut(story_id)
            .ok_or_else(|| WorkflowError::not_found(EntityKind::Story, story_id))?;
        let from = story.state;
        let to = from.resolve_target(target)?;

        let verdict = match self.gates.check_gates(story, to).into_result() {
            Ok(verdict) => verdict,
            Err(e) => {
                warn!(story_id, from = %from, to = %to, "Story transition rejected: {e}");
                return Err(e);
            }
        };

        story.update_state(to);
        let project_id = story.project_id.clone();

        let project = self.project_mut(&project_id)?;
        project.sync_story_state(story_id, to);
        if to == StoryState::Completed {
            project.completed_stories += 1;
            self.metrics.stories_completed += 1;
        }
        self.session_mut(&project_id)?.story_moved(story_id, to);
        self.metrics.story_transitions += 1;
        info!(project_id = %project_id, story_id, from = %from, to = %to, level = %verdict.level, "Story advanced");

        Ok(StoryAdvance {
            story_id: story_id.to_string(),
            project_id,
            from,
            to,
            verdict,
            next_steps: story_next_steps(to),
        })
    }

    /// Replace criteria, tasks or description with values from role logic.
    pub fn update_story(&mut self, story_id: &str, update: StoryUpdate) -> Result<()> {
        self.story_mut(story_id)?.apply(update);
        Ok(())
    }

    pub fn complete_task(&mut self, story_id: &str, index: usize) -> Result<()> {
        if !self.story_mut(story_id)?.complete_task(index) {
            return Err(WorkflowError::not_found(
                EntityKind::Task,
                format!("{story_id}#{index}"),
            ));
        }
        Ok(())
    }

    /// Store evidence consumed by gate checks (`unit_tests`, `open_defects`, ...).
    pub fn record_validation(
        &mut self,
        story_id: &str,
        key: &str,
        value: serde_json::Value,
    ) -> Result<()> {
        self.story_mut(story_id)?.record_validation(key, value);
        Ok(())
    }

    /// Run a QA command against a story and log it on the project session.
    pub fn run_gate_command(&mut self, story_id: &str, command: GateCommand) -> Result<GateOutcome> {
        let outcome = self.run_routed_gate_command(story_id, command)?;
        self.count_interaction(Role::Qa);
        Ok(outcome)
    }

    /// Run a QA command whose role interaction was already counted when the
    /// command was routed.
    pub fn run_routed_gate_command(
        &mut self,
        story_id: &str,
        command: GateCommand,
    ) -> Result<GateOutcome> {
        let story = self
            .active_stories
            .get_mut(story_id)
            .ok_or_else(|| WorkflowError::not_found(EntityKind::Story, story_id))?;
        let outcome = self.gates.run(story, command);
        let project_id = story.project_id.clone();

        let summary = outcome.summary();
        self.session_mut(&project_id)?
            .complete(ActionKind::QualityGate, summary, Some(Role::Qa));
        Ok(outcome)
    }
}
