use crate::error::{Result, WorkflowError};
use crate::models::roles::Role;

use super::types::{ProjectState, StoryState};

impl ProjectState {
    /// Ordered legal next states. The first entry is the default target.
    ///
    /// Valid transitions:
    /// - `IdeaGeneration` -> `AnalystResearch` | `ProjectBrief`
    /// - `PrdCreation` -> `UxDesign` | `Architecture`
    /// - `Architecture` -> `TestStrategy` | `MasterChecklist`
    /// - every other state has a single successor
    /// - `Completed` is a terminal state
    pub fn valid_transitions(&self) -> &'static [ProjectState] {
        use ProjectState::*;
        match self {
            IdeaGeneration => &[AnalystResearch, ProjectBrief],
            AnalystResearch => &[ProjectBrief],
            ProjectBrief => &[PrdCreation],
            PrdCreation => &[UxDesign, Architecture],
            UxDesign => &[Architecture],
            Architecture => &[TestStrategy, MasterChecklist],
            TestStrategy => &[MasterChecklist],
            MasterChecklist => &[Alignment],
            Alignment => &[DevelopmentReady],
            DevelopmentReady => &[InDevelopment],
            InDevelopment => &[Completed],
            Completed => &[],
        }
    }

    pub fn can_transition_to(&self, target: &ProjectState) -> bool {
        self.valid_transitions().contains(target)
    }

    /// Resolve an optional requested target against the legal set.
    ///
    /// `None` selects the default (first legal) successor.
    pub fn resolve_target(&self, requested: Option<ProjectState>) -> Result<ProjectState> {
        let legal = self.valid_transitions();
        let target = match requested {
            Some(target) => target,
            None => *legal.first().ok_or_else(|| WorkflowError::NoNextState {
                from: self.to_string(),
            })?,
        };

        if !self.can_transition_to(&target) {
            return Err(WorkflowError::InvalidTransition {
                from: self.to_string(),
                to: target.to_string(),
                legal: legal.iter().map(|s| s.to_string()).collect(),
            });
        }
        Ok(target)
    }

    pub fn is_terminal(&self) -> bool {
        self.valid_transitions().is_empty()
    }

    /// Role accountable for the work done while a project sits in this state:
    /// the first role in the registry that claims it.
    pub fn responsible_role(&self) -> Option<Role> {
        Role::ALL
            .into_iter()
            .find(|role| role.spec().project_states.contains(self))
    }
}

impl StoryState {
    /// Ordered legal next states. The first entry is the default target.
    ///
    /// The graph only moves forward. `Blocked` is reachable from every
    /// in-progress state and its single exit resumes `Development`.
    /// `Completed` is a terminal state.
    pub fn valid_transitions(&self) -> &'static [StoryState] {
        use StoryState::*;
        match self {
            Draft => &[RiskProfiling, Validation, Development],
            RiskProfiling => &[Validation, Development, Blocked],
            Validation => &[Development, Blocked],
            Development => &[QaCheck, ValidationTests, ReadyForReview, Blocked],
            QaCheck => &[ValidationTests, ReadyForReview, Blocked],
            ValidationTests => &[ReadyForReview, Blocked],
            ReadyForReview => &[QaReview, Blocked],
            QaReview => &[QualityGate, Blocked],
            QualityGate => &[Completed, Blocked],
            Completed => &[],
            Blocked => &[Development],
        }
    }

    pub fn can_transition_to(&self, target: &StoryState) -> bool {
        self.valid_transitions().contains(target)
    }

    /// Resolve an optional requested target against the legal set.
    pub fn resolve_target(&self, requested: Option<StoryState>) -> Result<StoryState> {
        let legal = self.valid_transitions();
        let target = match requested {
            Some(target) => target,
            None => *legal.first().ok_or_else(|| WorkflowError::NoNextState {
                from: self.to_string(),
            })?,
        };

        if !self.can_transition_to(&target) {
            return Err(WorkflowError::InvalidTransition {
                from: self.to_string(),
                to: target.to_string(),
                legal: legal.iter().map(|s| s.to_string()).collect(),
            });
        }
        Ok(target)
    }

    pub fn is_terminal(&self) -> bool {
        self.valid_transitions().is_empty()
    }

    pub fn responsible_role(&self) -> Option<Role> {
        Role::ALL
            .into_iter()
            .find(|role| role.spec().story_states.contains(self))
    }
}
