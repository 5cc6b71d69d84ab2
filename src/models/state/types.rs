use serde::{Deserialize, Serialize};

use crate::error::WorkflowError;

/// Phase of a project's methodology lifecycle.
///
/// Planning runs from `IdeaGeneration` through `Alignment`; stories can only
/// be created once the project reaches `DevelopmentReady`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectState {
    IdeaGeneration,
    AnalystResearch,
    ProjectBrief,
    PrdCreation,
    UxDesign,
    Architecture,
    TestStrategy,
    MasterChecklist,
    Alignment,
    DevelopmentReady,
    InDevelopment,
    Completed,
}

/// Phase of one story's development cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoryState {
    Draft,
    RiskProfiling,
    Validation,
    Development,
    QaCheck,
    ValidationTests,
    ReadyForReview,
    QaReview,
    QualityGate,
    Completed,
    /// Parked by an external blocker; can only resume into `Development`.
    Blocked,
}

/// Coarse phase of the live session cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowPhase {
    #[default]
    Planning,
    Development,
    QualityAssurance,
    Review,
    Completed,
    Paused,
    Error,
}

impl ProjectState {
    pub const ALL: [ProjectState; 12] = [
        ProjectState::IdeaGeneration,
        ProjectState::AnalystResearch,
        ProjectState::ProjectBrief,
        ProjectState::PrdCreation,
        ProjectState::UxDesign,
        ProjectState::Architecture,
        ProjectState::TestStrategy,
        ProjectState::MasterChecklist,
        ProjectState::Alignment,
        ProjectState::DevelopmentReady,
        ProjectState::InDevelopment,
        ProjectState::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectState::IdeaGeneration => "idea_generation",
            ProjectState::AnalystResearch => "analyst_research",
            ProjectState::ProjectBrief => "project_brief",
            ProjectState::PrdCreation => "prd_creation",
            ProjectState::UxDesign => "ux_design",
            ProjectState::Architecture => "architecture",
            ProjectState::TestStrategy => "test_strategy",
            ProjectState::MasterChecklist => "master_checklist",
            ProjectState::Alignment => "alignment",
            ProjectState::DevelopmentReady => "development_ready",
            ProjectState::InDevelopment => "in_development",
            ProjectState::Completed => "completed",
        }
    }

    /// True while the project is still in its planning half.
    pub fn is_planning(&self) -> bool {
        *self < ProjectState::DevelopmentReady
    }

    /// Stories may only be attached in these states.
    pub fn accepts_stories(&self) -> bool {
        matches!(
            self,
            ProjectState::DevelopmentReady | ProjectState::InDevelopment
        )
    }

    /// Display-only effort estimate for reaching this state.
    pub fn estimated_effort(&self) -> &'static str {
        match self {
            ProjectState::IdeaGeneration => "1-2 hours",
            ProjectState::AnalystResearch => "4-8 hours",
            ProjectState::ProjectBrief => "2-4 hours",
            ProjectState::PrdCreation => "8-16 hours",
            ProjectState::Architecture => "16-32 hours",
            ProjectState::DevelopmentReady => "2-4 hours",
            _ => "Unknown",
        }
    }
}

impl StoryState {
    pub const ALL: [StoryState; 11] = [
        StoryState::Draft,
        StoryState::RiskProfiling,
        StoryState::Validation,
        StoryState::Development,
        StoryState::QaCheck,
        StoryState::ValidationTests,
        StoryState::ReadyForReview,
        StoryState::QaReview,
        StoryState::QualityGate,
        StoryState::Completed,
        StoryState::Blocked,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StoryState::Draft => "draft",
            StoryState::RiskProfiling => "risk_profiling",
            StoryState::Validation => "validation",
            StoryState::Development => "development",
            StoryState::QaCheck => "qa_check",
            StoryState::ValidationTests => "validation_tests",
            StoryState::ReadyForReview => "ready_for_review",
            StoryState::QaReview => "qa_review",
            StoryState::QualityGate => "quality_gate",
            StoryState::Completed => "completed",
            StoryState::Blocked => "blocked",
        }
    }

    /// States between draft and completion in which a story can be blocked.
    pub fn is_in_progress(&self) -> bool {
        !matches!(
            self,
            StoryState::Draft | StoryState::Completed | StoryState::Blocked
        )
    }

    pub fn estimated_effort(&self) -> &'static str {
        match self {
            StoryState::RiskProfiling => "30-60 minutes",
            StoryState::Development => "2-8 hours",
            StoryState::QaCheck => "1-2 hours",
            StoryState::QaReview => "30-60 minutes",
            StoryState::QualityGate => "15-30 minutes",
            _ => "Unknown",
        }
    }

    /// Session phase a story in this state puts its project into.
    pub fn session_phase(&self) -> WorkflowPhase {
        match self {
            StoryState::QaCheck | StoryState::ValidationTests => WorkflowPhase::QualityAssurance,
            StoryState::ReadyForReview | StoryState::QaReview | StoryState::QualityGate => {
                WorkflowPhase::Review
            }
            _ => WorkflowPhase::Development,
        }
    }
}

impl std::fmt::Display for ProjectState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::fmt::Display for StoryState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::fmt::Display for WorkflowPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkflowPhase::Planning => write!(f, "planning"),
            WorkflowPhase::Development => write!(f, "development"),
            WorkflowPhase::QualityAssurance => write!(f, "quality_assurance"),
            WorkflowPhase::Review => write!(f, "review"),
            WorkflowPhase::Completed => write!(f, "completed"),
            WorkflowPhase::Paused => write!(f, "paused"),
            WorkflowPhase::Error => write!(f, "error"),
        }
    }
}

impl std::str::FromStr for ProjectState {
    type Err = WorkflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        ProjectState::ALL
            .into_iter()
            .find(|state| state.as_str() == wanted)
            .ok_or_else(|| WorkflowError::InvalidState {
                value: s.to_string(),
            })
    }
}

impl std::str::FromStr for StoryState {
    type Err = WorkflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        StoryState::ALL
            .into_iter()
            .find(|state| state.as_str() == wanted)
            .ok_or_else(|| WorkflowError::InvalidState {
                value: s.to_string(),
            })
    }
}
