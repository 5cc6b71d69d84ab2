use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::roles::Role;
use crate::models::state::WorkflowPhase;

/// What kind of bookkeeping entry a session action is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Assignment,
    Command,
    ProjectTransition,
    StoryTransition,
    QualityGate,
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionKind::Assignment => write!(f, "assignment"),
            ActionKind::Command => write!(f, "command"),
            ActionKind::ProjectTransition => write!(f, "project_transition"),
            ActionKind::StoryTransition => write!(f, "story_transition"),
            ActionKind::QualityGate => write!(f, "quality_gate"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionAction {
    pub kind: ActionKind,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    pub timestamp: DateTime<Utc>,
}

/// Live cursor for one project. Exactly one per project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowSession {
    pub id: String,
    pub project_id: String,
    pub active_story: Option<String>,
    pub active_role: Option<Role>,
    pub phase: WorkflowPhase,
    /// Name of the state the cursor last moved to; story states carry a
    /// `story_` prefix.
    pub current_step: String,
    #[serde(default)]
    pub pending_actions: Vec<SessionAction>,
    #[serde(default)]
    pub completed_actions: Vec<SessionAction>,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
}
