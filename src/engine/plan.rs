use serde::{Deserialize, Serialize};

use crate::error::WorkflowError;
use crate::models::roles::{roles_for_project_state, roles_for_story_state, Role};
use crate::models::state::{ProjectState, StoryState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowType {
    #[default]
    Full,
    PlanningOnly,
    DevelopmentOnly,
}

impl WorkflowType {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowType::Full => "full",
            WorkflowType::PlanningOnly => "planning_only",
            WorkflowType::DevelopmentOnly => "development_only",
        }
    }
}

impl std::fmt::Display for WorkflowType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for WorkflowType {
    type Err = WorkflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "full" => Ok(WorkflowType::Full),
            "planning_only" => Ok(WorkflowType::PlanningOnly),
            "development_only" => Ok(WorkflowType::DevelopmentOnly),
            _ => Err(WorkflowError::InvalidState {
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanPhase {
    pub name: String,
    #[serde(default)]
    pub project_states: Vec<ProjectState>,
    #[serde(default)]
    pub story_states: Vec<StoryState>,
    pub roles: Vec<Role>,
}

/// Phases, roles and gates expected for a workflow, fixed at start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionPlan {
    pub workflow_type: WorkflowType,
    pub phases: Vec<PlanPhase>,
    pub required_roles: Vec<Role>,
    pub quality_gates: Vec<String>,
    pub estimated_duration: String,
}

impl ExecutionPlan {
    pub fn build(workflow_type: WorkflowType) -> Self {
        let planning: Vec<ProjectState> = ProjectState::ALL
            .into_iter()
            .filter(ProjectState::is_planning)
            .collect();

        let (phases, quality_gates, estimated_duration) = match workflow_type {
            WorkflowType::Full => (
                vec![
                    phase("planning", planning, vec![]),
                    development_phase(),
                    quality_phase(),
                    completion_phase(),
                ],
                &["risk_assessment", "design_review", "comprehensive_review", "final_gate"][..],
                "4-8 weeks",
            ),
            WorkflowType::PlanningOnly => (
                vec![phase("planning", planning, vec![])],
                &["requirements_review", "architecture_review"][..],
                "1-2 weeks",
            ),
            WorkflowType::DevelopmentOnly => (
                vec![development_phase(), quality_phase(), completion_phase()],
                &["code_review", "comprehensive_review", "final_gate"][..],
                "2-6 weeks",
            ),
        };

        let mut required_roles: Vec<Role> =
            phases.iter().flat_map(|p| p.roles.iter().copied()).collect();
        required_roles.sort();
        required_roles.dedup();

        Self {
            workflow_type,
            phases,
            required_roles,
            quality_gates: quality_gates.iter().map(|g| g.to_string()).collect(),
            estimated_duration: estimated_duration.to_string(),
        }
    }

    pub fn project_states(&self) -> Vec<ProjectState> {
        self.phases
            .iter()
            .flat_map(|p| p.project_states.iter().copied())
            .collect()
    }

    /// Share of the plan's project states already reached.
    pub fn completion_percentage(&self, current: ProjectState) -> f64 {
        let states = self.project_states();
        if states.is_empty() {
            return 0.0;
        }
        let reached = states.iter().filter(|s| **s <= current).count();
        reached as f64 / states.len() as f64 * 100.0
    }
}

fn phase(name: &str, project_states: Vec<ProjectState>, story_states: Vec<StoryState>) -> PlanPhase {
    let mut roles: Vec<Role> = project_states
        .iter()
        .flat_map(|s| roles_for_project_state(*s))
        .chain(story_states.iter().flat_map(|s| roles_for_story_state(*s)))
        .collect();
    roles.sort();
    roles.dedup();

    PlanPhase {
        name: name.to_string(),
        project_states,
        story_states,
        roles,
    }
}

fn development_phase() -> PlanPhase {
    phase(
        "development",
        vec![ProjectState::DevelopmentReady, ProjectState::InDevelopment],
        vec![StoryState::Development],
    )
}

fn quality_phase() -> PlanPhase {
    phase(
        "quality",
        vec![],
        vec![StoryState::QaCheck, StoryState::QaReview, StoryState::QualityGate],
    )
}

fn completion_phase() -> PlanPhase {
    phase("completion", vec![ProjectState::Completed], vec![])
}
