use chrono::Utc;

use super::types::{ActionKind, SessionAction, WorkflowSession};
use crate::models::project::ProjectContext;
use crate::models::roles::Role;
use crate::models::state::{ProjectState, StoryState, WorkflowPhase};
use crate::models::story::StoryContext;

impl WorkflowSession {
    pub fn new(project: &ProjectContext) -> Self {
        let now = Utc::now();
        Self {
            id: project.session_id(),
            project_id: project.id.clone(),
            active_story: None,
            active_role: project.state.responsible_role(),
            phase: Self::phase_for_project(project.state),
            current_step: project.state.to_string(),
            pending_actions: Vec::new(),
            completed_actions: Vec::new(),
            created_at: now,
            last_active: now,
        }
    }

    /// Rebuild a lost session from its project and stories.
    ///
    /// The active story is the most recently updated one that is not yet
    /// completed; action logs cannot be recovered and start empty.
    pub fn reconstruct(project: &ProjectContext, stories: &[StoryContext]) -> Self {
        let mut session = Self::new(project);

        let active = stories
            .iter()
            .filter(|s| s.project_id == project.id && s.state != StoryState::Completed)
            .max_by_key(|s| s.updated_at);

        if let Some(story) = active {
            session.focus_story(&story.id, story.state);
        }
        session
    }

    pub fn phase_for_project(state: ProjectState) -> WorkflowPhase {
        if state == ProjectState::Completed {
            WorkflowPhase::Completed
        } else if state.is_planning() {
            WorkflowPhase::Planning
        } else {
            WorkflowPhase::Development
        }
    }

    /// Move the cursor after a project-level transition.
    pub fn project_moved(&mut self, state: ProjectState) {
        self.current_step = state.to_string();
        self.phase = Self::phase_for_project(state);
        if let Some(role) = state.responsible_role() {
            self.active_role = Some(role);
        }
        self.complete(
            ActionKind::ProjectTransition,
            format!("Project advanced to {state}"),
            state.responsible_role(),
        );
    }

    /// Point the cursor at a story and derive the phase from its state.
    pub fn focus_story(&mut self, story_id: &str, state: StoryState) {
        self.active_story = Some(story_id.to_string());
        self.current_step = format!("story_{state}");
        self.phase = state.session_phase();
        if let Some(role) = state.responsible_role() {
            self.active_role = Some(role);
        }
        self.touch();
    }

    pub fn story_moved(&mut self, story_id: &str, state: StoryState) {
        self.focus_story(story_id, state);
        if state == StoryState::Completed && self.active_story.as_deref() == Some(story_id) {
            self.active_story = None;
        }
        self.complete(
            ActionKind::StoryTransition,
            format!("Story {story_id} advanced to {state}"),
            state.responsible_role(),
        );
    }

    pub fn enqueue(&mut self, kind: ActionKind, description: impl Into<String>, role: Option<Role>) {
        self.pending_actions.push(SessionAction {
            kind,
            description: description.into(),
            role,
            timestamp: Utc::now(),
        });
        self.touch();
    }

    /// Log finished work. A command or gate run by a role also closes that
    /// role's pending assignments.
    pub fn complete(&mut self, kind: ActionKind, description: impl Into<String>, role: Option<Role>) {
        if let (ActionKind::Command | ActionKind::QualityGate, Some(role)) = (kind, role) {
            self.resolve_pending(role);
        }
        self.completed_actions.push(SessionAction {
            kind,
            description: description.into(),
            role,
            timestamp: Utc::now(),
        });
        self.touch();
    }

    fn resolve_pending(&mut self, role: Role) {
        let (done, pending): (Vec<_>, Vec<_>) = self
            .pending_actions
            .drain(..)
            .partition(|action| action.role == Some(role));
        self.pending_actions = pending;
        self.completed_actions.extend(done);
    }

    pub fn engage(&mut self, role: Role) {
        self.active_role = Some(role);
        self.touch();
    }

    fn touch(&mut self) {
        self.last_active = Utc::now();
    }
}
