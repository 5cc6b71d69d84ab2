use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::gates::GateRecord;
use crate::models::roles::Role;
use crate::models::state::{ProjectState, StoryState};

/// Named artifact slots a project accumulates during planning.
///
/// The core only checks whether a slot is populated; the content itself is
/// opaque and supplied by external role logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactSlot {
    Idea,
    Research,
    Brief,
    Prd,
    UxDesign,
    Architecture,
    TestStrategy,
    MasterChecklist,
}

impl ArtifactSlot {
    pub const ALL: [ArtifactSlot; 8] = [
        ArtifactSlot::Idea,
        ArtifactSlot::Research,
        ArtifactSlot::Brief,
        ArtifactSlot::Prd,
        ArtifactSlot::UxDesign,
        ArtifactSlot::Architecture,
        ArtifactSlot::TestStrategy,
        ArtifactSlot::MasterChecklist,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactSlot::Idea => "idea",
            ArtifactSlot::Research => "research",
            ArtifactSlot::Brief => "brief",
            ArtifactSlot::Prd => "prd",
            ArtifactSlot::UxDesign => "ux_design",
            ArtifactSlot::Architecture => "architecture",
            ArtifactSlot::TestStrategy => "test_strategy",
            ArtifactSlot::MasterChecklist => "master_checklist",
        }
    }

    /// Slots that must be populated before a project may enter `target`.
    pub fn required_for(target: ProjectState) -> &'static [ArtifactSlot] {
        match target {
            ProjectState::ProjectBrief => &[ArtifactSlot::Idea],
            ProjectState::PrdCreation => &[ArtifactSlot::Brief],
            ProjectState::Architecture => &[ArtifactSlot::Prd],
            ProjectState::DevelopmentReady => {
                &[ArtifactSlot::Architecture, ArtifactSlot::MasterChecklist]
            }
            _ => &[],
        }
    }

    /// Human-readable prerequisites shown in next-step hints.
    pub fn prerequisite_hints(target: ProjectState) -> &'static [&'static str] {
        match target {
            ProjectState::AnalystResearch => &["project idea defined"],
            ProjectState::ProjectBrief => &["research completed"],
            ProjectState::PrdCreation => &["project brief approved"],
            ProjectState::Architecture => &["PRD completed"],
            ProjectState::DevelopmentReady => {
                &["architecture approved", "master checklist completed"]
            }
            _ => &[],
        }
    }
}

impl std::fmt::Display for ArtifactSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ArtifactSlot {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        ArtifactSlot::ALL
            .into_iter()
            .find(|slot| slot.as_str() == wanted || (wanted == "requirements" && *slot == ArtifactSlot::Prd))
            .ok_or_else(|| anyhow::anyhow!("Unknown artifact slot: {s}"))
    }
}

/// Lightweight reference to a story kept in project order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryRef {
    pub story_id: String,
    pub title: String,
    pub state: StoryState,
    pub created_at: DateTime<Utc>,
}

/// One project moving through the methodology.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectContext {
    pub id: String,
    pub name: String,
    pub state: ProjectState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub artifacts: BTreeMap<ArtifactSlot, String>,
    /// task type -> role
    #[serde(default)]
    pub assigned_roles: BTreeMap<String, Role>,
    #[serde(default)]
    pub stories: Vec<StoryRef>,
    #[serde(default)]
    pub completed_stories: u32,
    #[serde(default)]
    pub gate_history: Vec<GateRecord>,
}

impl ProjectContext {
    pub fn new(id: String, name: String, idea: Option<String>) -> Self {
        let now = Utc::now();
        let mut artifacts = BTreeMap::new();
        if let Some(idea) = idea.filter(|i| !i.trim().is_empty()) {
            artifacts.insert(ArtifactSlot::Idea, idea);
        }

        Self {
            id,
            name,
            state: ProjectState::IdeaGeneration,
            created_at: now,
            updated_at: now,
            artifacts,
            assigned_roles: BTreeMap::new(),
            stories: Vec::new(),
            completed_stories: 0,
            gate_history: Vec::new(),
        }
    }

    pub fn generate_id() -> String {
        let timestamp = Utc::now().timestamp();
        let uuid_short = uuid::Uuid::new_v4()
            .to_string()
            .split('-')
            .next()
            .unwrap_or("")
            .to_string();
        format!("proj-{uuid_short}-{timestamp}")
    }

    pub fn has_artifact(&self, slot: ArtifactSlot) -> bool {
        self.artifacts
            .get(&slot)
            .is_some_and(|value| !value.trim().is_empty())
    }

    pub fn artifact(&self, slot: ArtifactSlot) -> Option<&str> {
        self.artifacts.get(&slot).map(String::as_str)
    }

    pub fn set_artifact(&mut self, slot: ArtifactSlot, value: String) {
        self.artifacts.insert(slot, value);
        self.updated_at = Utc::now();
    }

    /// Required slots for `target` that are still empty.
    pub fn missing_prerequisites(&self, target: ProjectState) -> Vec<ArtifactSlot> {
        ArtifactSlot::required_for(target)
            .iter()
            .copied()
            .filter(|slot| !self.has_artifact(*slot))
            .collect()
    }

    pub fn update_state(&mut self, state: ProjectState) {
        self.state = state;
        self.updated_at = Utc::now();
    }

    /// Next story id, numbered within the project.
    pub fn next_story_id(&self) -> String {
        format!("{}-story-{:03}", self.id, self.stories.len() + 1)
    }

    pub fn session_id(&self) -> String {
        format!("{}-session-001", self.id)
    }

    pub fn link_story(&mut self, story: StoryRef) {
        self.stories.push(story);
        self.updated_at = Utc::now();
    }

    /// Mirror a story's new state into the project's ordered list.
    pub fn sync_story_state(&mut self, story_id: &str, state: StoryState) {
        if let Some(entry) = self.stories.iter_mut().find(|s| s.story_id == story_id) {
            entry.state = state;
            self.updated_at = Utc::now();
        }
    }

    pub fn record_gate(&mut self, record: GateRecord) {
        self.gate_history.push(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project() -> ProjectContext {
        ProjectContext::new("proj-1".to_string(), "Checkout Redesign".to_string(), None)
    }

    #[test]
    fn test_new_project_starts_in_idea_generation() {
        let p = project();
        assert_eq!(p.state, ProjectState::IdeaGeneration);
        assert!(p.artifacts.is_empty());
        assert!(p.stories.is_empty());
    }

    #[test]
    fn test_idea_populates_slot() {
        let p = ProjectContext::new("p".into(), "n".into(), Some("sell more".into()));
        assert!(p.has_artifact(ArtifactSlot::Idea));
    }

    #[test]
    fn test_blank_artifact_counts_as_missing() {
        let mut p = project();
        p.set_artifact(ArtifactSlot::Prd, "   ".to_string());
        assert_eq!(
            p.missing_prerequisites(ProjectState::Architecture),
            vec![ArtifactSlot::Prd]
        );
    }

    #[test]
    fn test_development_ready_requires_two_slots() {
        let mut p = project();
        p.set_artifact(ArtifactSlot::Architecture, "layered".to_string());
        assert_eq!(
            p.missing_prerequisites(ProjectState::DevelopmentReady),
            vec![ArtifactSlot::MasterChecklist]
        );
    }

    #[test]
    fn test_story_ids_are_scoped_and_sequential() {
        let mut p = project();
        assert_eq!(p.next_story_id(), "proj-1-story-001");
        p.link_story(StoryRef {
            story_id: p.next_story_id(),
            title: "first".into(),
            state: StoryState::Draft,
            created_at: Utc::now(),
        });
        assert_eq!(p.next_story_id(), "proj-1-story-002");
    }

    #[test]
    fn test_requirements_alias_parses_to_prd() {
        let slot: ArtifactSlot = "requirements".parse().unwrap();
        assert_eq!(slot, ArtifactSlot::Prd);
    }
}
