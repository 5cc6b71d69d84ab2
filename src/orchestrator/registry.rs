use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::config::WorkflowConfig;
use crate::error::{EntityKind, Result, WorkflowError};
use crate::gates::{GateMetrics, QualityGateEngine};
use crate::models::project::ProjectContext;
use crate::models::roles::Role;
use crate::models::session::WorkflowSession;
use crate::models::story::StoryContext;

/// Counters kept across the orchestrator's lifetime.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrchestratorMetrics {
    pub projects_created: u64,
    pub stories_created: u64,
    pub stories_completed: u64,
    pub project_transitions: u64,
    pub story_transitions: u64,
    pub role_interactions: BTreeMap<Role, u64>,
    #[serde(default)]
    pub gates: GateMetrics,
}

/// Sole owner of the active projects, stories and sessions.
///
/// Every mutation goes through a method on this type. Callers must serialize
/// calls that touch the same project; no locking is done here.
pub struct Orchestrator {
    pub(super) active_projects: BTreeMap<String, ProjectContext>,
    pub(super) active_stories: BTreeMap<String, StoryContext>,
    /// keyed by session id
    pub(super) active_sessions: BTreeMap<String, WorkflowSession>,
    pub(super) gates: QualityGateEngine,
    pub(super) metrics: OrchestratorMetrics,
}

impl Orchestrator {
    pub fn new(config: &WorkflowConfig) -> Self {
        Self::with_gate_engine(QualityGateEngine::new(config))
    }

    pub fn with_gate_engine(gates: QualityGateEngine) -> Self {
        Self {
            active_projects: BTreeMap::new(),
            active_stories: BTreeMap::new(),
            active_sessions: BTreeMap::new(),
            gates,
            metrics: OrchestratorMetrics::default(),
        }
    }

    pub fn project(&self, project_id: &str) -> Option<&ProjectContext> {
        self.active_projects.get(project_id)
    }

    pub fn story(&self, story_id: &str) -> Option<&StoryContext> {
        self.active_stories.get(story_id)
    }

    pub fn session_for(&self, project_id: &str) -> Option<&WorkflowSession> {
        self.active_projects
            .get(project_id)
            .and_then(|p| self.active_sessions.get(&p.session_id()))
    }

    pub fn project_ids(&self) -> impl Iterator<Item = &String> {
        self.active_projects.keys()
    }

    /// Stories of a project in creation order.
    pub fn stories_for(&self, project_id: &str) -> Vec<&StoryContext> {
        self.active_projects
            .get(project_id)
            .map(|p| {
                p.stories
                    .iter()
                    .filter_map(|r| self.active_stories.get(&r.story_id))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn metrics(&self) -> OrchestratorMetrics {
        OrchestratorMetrics {
            gates: self.gates.metrics().clone(),
            ..self.metrics.clone()
        }
    }

    /// Replay persisted records through the same registration path used at
    /// runtime. A missing session is rebuilt from the project and its stories.
    pub fn restore(
        &mut self,
        project: ProjectContext,
        stories: Vec<StoryContext>,
        session: Option<WorkflowSession>,
    ) {
        let session =
            session.unwrap_or_else(|| WorkflowSession::reconstruct(&project, &stories));
        debug!(project_id = %project.id, stories = stories.len(), "Restoring project");
        self.register_project(project, session);
        for story in stories {
            self.register_story(story);
        }
    }

    pub(super) fn register_project(&mut self, project: ProjectContext, session: WorkflowSession) {
        self.active_sessions.insert(session.id.clone(), session);
        self.active_projects.insert(project.id.clone(), project);
    }

    pub(super) fn register_story(&mut self, story: StoryContext) {
        self.active_stories.insert(story.id.clone(), story);
    }

    pub(super) fn project_ref(&self, project_id: &str) -> Result<&ProjectContext> {
        self.project(project_id)
            .ok_or_else(|| WorkflowError::not_found(EntityKind::Project, project_id))
    }

    pub(super) fn story_ref(&self, story_id: &str) -> Result<&StoryContext> {
        self.story(story_id)
            .ok_or_else(|| WorkflowError::not_found(EntityKind::Story, story_id))
    }

    pub(super) fn project_mut(&mut self, project_id: &str) -> Result<&mut ProjectContext> {
        self.active_projects
            .get_mut(project_id)
            .ok_or_else(|| WorkflowError::not_found(EntityKind::Project, project_id))
    }

    pub(super) fn story_mut(&mut self, story_id: &str) -> Result<&mut StoryContext> {
        self.active_stories
            .get_mut(story_id)
            .ok_or_else(|| WorkflowError::not_found(EntityKind::Story, story_id))
    }

    pub(super) fn session_mut(&mut self, project_id: &str) -> Result<&mut WorkflowSession> {
        let session_id = self
            .active_projects
            .get(project_id)
            .map(ProjectContext::session_id)
            .ok_or_else(|| WorkflowError::not_found(EntityKind::Project, project_id))?;
        self.active_sessions
            .get_mut(&session_id)
            .ok_or_else(|| WorkflowError::not_found(EntityKind::Session, session_id))
    }

    pub(super) fn count_interaction(&mut self, role: Role) {
        *self.metrics.role_interactions.entry(role).or_insert(0) += 1;
    }
}
