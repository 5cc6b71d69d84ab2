use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::gates::{Certificate, GateRecord};
use crate::models::roles::Role;
use crate::models::state::StoryState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "LOW"),
            RiskLevel::Medium => write!(f, "MEDIUM"),
            RiskLevel::High => write!(f, "HIGH"),
        }
    }
}

/// Result of a risk assessment, stored on the story.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskProfile {
    pub level: RiskLevel,
    pub complexity_score: u8,
    pub dependency_score: u8,
    pub time_score: u8,
    #[serde(default)]
    pub risk_factors: Vec<String>,
    #[serde(default)]
    pub mitigations: Vec<String>,
    #[serde(default)]
    pub next_actions: Vec<String>,
    pub assessed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestScenario {
    pub name: String,
    pub kind: String,
    pub description: String,
}

/// Test plan designed for a story before QA.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestStrategy {
    pub test_types: Vec<String>,
    pub scenarios: Vec<TestScenario>,
    pub automation_percentage: u32,
    #[serde(default)]
    pub quality_criteria: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryTask {
    pub title: String,
    #[serde(default)]
    pub completed: bool,
}

impl StoryTask {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            completed: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentNote {
    pub role: Role,
    pub note: String,
    pub timestamp: DateTime<Utc>,
}

/// Partial update applied by external role logic. `None` leaves a field alone.
#[derive(Debug, Clone, Default)]
pub struct StoryUpdate {
    pub description: Option<String>,
    pub acceptance_criteria: Option<Vec<String>>,
    pub tasks: Option<Vec<String>>,
}

/// One unit of work inside a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryContext {
    pub id: String,
    pub project_id: String,
    pub title: String,
    pub description: Option<String>,
    pub epic_id: Option<String>,
    pub state: StoryState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub acceptance_criteria: Vec<String>,
    #[serde(default)]
    pub tasks: Vec<StoryTask>,
    pub risk_profile: Option<RiskProfile>,
    pub test_strategy: Option<TestStrategy>,
    /// check name -> evidence supplied by external tooling
    #[serde(default)]
    pub validation_results: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub assigned_roles: BTreeMap<String, Role>,
    #[serde(default)]
    pub agent_notes: Vec<AgentNote>,
    #[serde(default)]
    pub gate_history: Vec<GateRecord>,
    pub certificate: Option<Certificate>,
}

impl StoryContext {
    pub fn new(
        id: String,
        project_id: String,
        title: String,
        description: Option<String>,
        epic_id: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            project_id,
            title,
            description,
            epic_id,
            state: StoryState::Draft,
            created_at: now,
            updated_at: now,
            acceptance_criteria: Vec::new(),
            tasks: Vec::new(),
            risk_profile: None,
            test_strategy: None,
            validation_results: BTreeMap::new(),
            assigned_roles: BTreeMap::new(),
            agent_notes: Vec::new(),
            gate_history: Vec::new(),
            certificate: None,
        }
    }

    pub fn update_state(&mut self, state: StoryState) {
        self.state = state;
        self.updated_at = Utc::now();
    }

    pub fn apply(&mut self, update: StoryUpdate) {
        if let Some(description) = update.description {
            self.description = Some(description);
        }
        if let Some(criteria) = update.acceptance_criteria {
            self.acceptance_criteria = criteria;
        }
        if let Some(tasks) = update.tasks {
            self.tasks = tasks.into_iter().map(StoryTask::new).collect();
        }
        self.updated_at = Utc::now();
    }

    /// Mark a task done. Returns false when the index is out of range.
    pub fn complete_task(&mut self, index: usize) -> bool {
        match self.tasks.get_mut(index) {
            Some(task) => {
                task.completed = true;
                self.updated_at = Utc::now();
                true
            }
            None => false,
        }
    }

    pub fn all_tasks_completed(&self) -> bool {
        self.tasks.iter().all(|t| t.completed)
    }

    pub fn add_agent_note(&mut self, role: Role, note: impl Into<String>) {
        self.agent_notes.push(AgentNote {
            role,
            note: note.into(),
            timestamp: Utc::now(),
        });
        self.updated_at = Utc::now();
    }

    pub fn record_validation(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.validation_results.insert(key.into(), value);
        self.updated_at = Utc::now();
    }

    pub fn record_gate(&mut self, record: GateRecord) {
        self.gate_history.push(record);
    }

    pub fn description_len(&self) -> usize {
        self.description.as_deref().map(str::len).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn story() -> StoryContext {
        StoryContext::new(
            "proj-1-story-001".into(),
            "proj-1".into(),
            "Cart totals".into(),
            None,
            None,
        )
    }

    #[test]
    fn test_new_story_is_draft() {
        let s = story();
        assert_eq!(s.state, StoryState::Draft);
        assert!(s.acceptance_criteria.is_empty());
        assert!(s.certificate.is_none());
    }

    #[test]
    fn test_apply_update_replaces_only_given_fields() {
        let mut s = story();
        s.apply(StoryUpdate {
            acceptance_criteria: Some(vec!["totals include tax".into()]),
            tasks: Some(vec!["wire endpoint".into(), "add tests".into()]),
            ..Default::default()
        });
        assert_eq!(s.acceptance_criteria.len(), 1);
        assert_eq!(s.tasks.len(), 2);
        assert!(s.description.is_none());
        assert!(!s.all_tasks_completed());
    }

    #[test]
    fn test_complete_task_out_of_range() {
        let mut s = story();
        s.apply(StoryUpdate {
            tasks: Some(vec!["only".into()]),
            ..Default::default()
        });
        assert!(!s.complete_task(3));
        assert!(s.complete_task(0));
        assert!(s.all_tasks_completed());
    }

    #[test]
    fn test_agent_notes_are_appended() {
        let mut s = story();
        s.add_agent_note(Role::Dev, "started");
        s.add_agent_note(Role::Qa, "reviewed");
        assert_eq!(s.agent_notes.len(), 2);
        assert_eq!(s.agent_notes[1].role, Role::Qa);
    }
}
