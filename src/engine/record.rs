use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::automation::AutomationEvent;
use super::plan::{ExecutionPlan, WorkflowType};
use crate::gates::GateCommand;
use crate::models::project::ProjectContext;
use crate::models::roles::Role;
use crate::models::session::WorkflowSession;
use crate::models::state::{ProjectState, StoryState};
use crate::models::story::StoryContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    Active,
    Completed,
}

/// One QA command run through the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateRun {
    pub story_id: String,
    pub gate: GateCommand,
    /// `None` for commands that only produce a report.
    pub passed: Option<bool>,
    pub summary: String,
    pub timestamp: DateTime<Utc>,
}

/// Engine-side bookkeeping for a single project workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowRecord {
    pub workflow_id: String,
    pub project_id: String,
    pub session_id: String,
    pub workflow_type: WorkflowType,
    pub status: RecordStatus,
    pub plan: ExecutionPlan,
    pub current_state: ProjectState,
    #[serde(default)]
    pub current_story_id: Option<String>,
    #[serde(default)]
    pub current_story_state: Option<StoryState>,
    #[serde(default)]
    pub last_agent: Option<Role>,
    #[serde(default)]
    pub agent_interactions: BTreeMap<Role, u64>,
    #[serde(default)]
    pub quality_gates: Vec<GateRun>,
    #[serde(default)]
    pub automation_events: Vec<AutomationEvent>,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub last_advancement: Option<DateTime<Utc>>,
}

impl WorkflowRecord {
    pub fn workflow_id_for(project_id: &str) -> String {
        format!("workflow-{project_id}")
    }

    pub fn new(
        project_id: &str,
        session_id: &str,
        workflow_type: WorkflowType,
        state: ProjectState,
    ) -> Self {
        Self {
            workflow_id: Self::workflow_id_for(project_id),
            project_id: project_id.to_string(),
            session_id: session_id.to_string(),
            workflow_type,
            status: RecordStatus::Active,
            plan: ExecutionPlan::build(workflow_type),
            current_state: state,
            current_story_id: None,
            current_story_state: None,
            last_agent: None,
            agent_interactions: BTreeMap::new(),
            quality_gates: Vec::new(),
            automation_events: Vec::new(),
            started_at: Utc::now(),
            last_advancement: None,
        }
    }

    pub fn engage(&mut self, role: Role) {
        self.last_agent = Some(role);
        *self.agent_interactions.entry(role).or_insert(0) += 1;
    }

    pub fn project_moved(&mut self, state: ProjectState) {
        self.current_state = state;
        self.last_advancement = Some(Utc::now());
        if state == ProjectState::Completed {
            self.status = RecordStatus::Completed;
        }
    }

    pub fn story_moved(&mut self, story_id: &str, state: StoryState) {
        if self.current_story_id.as_deref() == Some(story_id) {
            self.current_story_state = Some(state);
        }
        self.last_advancement = Some(Utc::now());
    }
}

/// Everything persisted for one workflow id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowSnapshot {
    pub record: WorkflowRecord,
    pub project: ProjectContext,
    #[serde(default)]
    pub session: Option<WorkflowSession>,
    #[serde(default)]
    pub stories: Vec<StoryContext>,
}
