//! Role and command registry.
//!
//! A static table: each role declares the commands it accepts and the
//! project/story states it is responsible for. The registry is read-only;
//! routing decisions consult it but never change it.

use serde::{Deserialize, Serialize};

use crate::error::WorkflowError;
use crate::models::state::{ProjectState, StoryState};

/// A specialized role in the methodology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Analyst,
    Architect,
    Pm,
    Dev,
    Qa,
}

/// Static responsibilities declared by a role.
#[derive(Debug, Clone, Copy)]
pub struct RoleSpec {
    pub role: Role,
    pub commands: &'static [&'static str],
    pub project_states: &'static [ProjectState],
    pub story_states: &'static [StoryState],
}

const REGISTRY: [RoleSpec; 5] = [
    RoleSpec {
        role: Role::Analyst,
        commands: &["*research", "*analyze", "*risk"],
        project_states: &[ProjectState::AnalystResearch],
        story_states: &[StoryState::RiskProfiling],
    },
    RoleSpec {
        role: Role::Architect,
        commands: &["*create-architecture", "*design", "*review"],
        project_states: &[ProjectState::Architecture, ProjectState::TestStrategy],
        story_states: &[StoryState::Development],
    },
    RoleSpec {
        role: Role::Pm,
        commands: &["*create-prd", "*draft-story", "*validate"],
        project_states: &[
            ProjectState::ProjectBrief,
            ProjectState::PrdCreation,
            ProjectState::MasterChecklist,
        ],
        story_states: &[StoryState::Draft, StoryState::Validation],
    },
    RoleSpec {
        role: Role::Dev,
        commands: &["*implement", "*code", "*test"],
        project_states: &[ProjectState::InDevelopment],
        story_states: &[StoryState::Development],
    },
    RoleSpec {
        role: Role::Qa,
        commands: &["*risk", "*design", "*trace", "*nfr", "*review", "*gate"],
        project_states: &[ProjectState::TestStrategy, ProjectState::MasterChecklist],
        story_states: &[
            StoryState::QaCheck,
            StoryState::QaReview,
            StoryState::QualityGate,
        ],
    },
];

/// Task-type keywords checked in order when no state owner applies.
const KEYWORD_ROUTES: [(&str, Role); 11] = [
    ("research", Role::Analyst),
    ("analysis", Role::Analyst),
    ("architecture", Role::Architect),
    ("design", Role::Architect),
    ("development", Role::Dev),
    ("implementation", Role::Dev),
    ("testing", Role::Qa),
    ("quality", Role::Qa),
    ("review", Role::Qa),
    ("planning", Role::Pm),
    ("coordination", Role::Pm),
];

impl Role {
    pub const ALL: [Role; 5] = [Role::Analyst, Role::Architect, Role::Pm, Role::Dev, Role::Qa];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Analyst => "analyst",
            Role::Architect => "architect",
            Role::Pm => "pm",
            Role::Dev => "dev",
            Role::Qa => "qa",
        }
    }

    pub fn spec(&self) -> &'static RoleSpec {
        // REGISTRY is ordered like Role::ALL
        &REGISTRY[*self as usize]
    }

    pub fn commands(&self) -> &'static [&'static str] {
        self.spec().commands
    }

    pub fn accepts(&self, command: &str) -> bool {
        self.commands().contains(&command)
    }

    /// Validate a command against this role's declared set.
    pub fn check_command(&self, command: &str) -> Result<(), WorkflowError> {
        if self.accepts(command) {
            return Ok(());
        }
        Err(WorkflowError::CommandNotAllowed {
            role: *self,
            command: command.to_string(),
            allowed: self.commands().iter().map(|c| c.to_string()).collect(),
        })
    }

    /// Route a free-form task type by keyword, defaulting to the PM.
    pub fn for_task_type(task_type: &str) -> Role {
        let lowered = task_type.to_lowercase();
        KEYWORD_ROUTES
            .iter()
            .find(|(keyword, _)| lowered.contains(keyword))
            .map(|(_, role)| *role)
            .unwrap_or(Role::Pm)
    }

    /// Expected outcome of well-known role commands, used for next-step hints.
    pub fn predicted_outcome(&self, command: &str) -> Option<&'static str> {
        match (self, command) {
            (Role::Analyst, "*research") => Some("research_completed"),
            (Role::Architect, "*create-architecture") => Some("architecture_completed"),
            (Role::Pm, "*create-prd") => Some("prd_completed"),
            (Role::Dev, "*implement") => Some("development_completed"),
            (Role::Qa, "*review") => Some("review_completed"),
            _ => None,
        }
    }
}

/// Every role declaring responsibility for a project state, in registry order.
pub fn roles_for_project_state(state: ProjectState) -> Vec<Role> {
    REGISTRY
        .iter()
        .filter(|spec| spec.project_states.contains(&state))
        .map(|spec| spec.role)
        .collect()
}

/// Every role declaring responsibility for a story state, in registry order.
pub fn roles_for_story_state(state: StoryState) -> Vec<Role> {
    REGISTRY
        .iter()
        .filter(|spec| spec.story_states.contains(&state))
        .map(|spec| spec.role)
        .collect()
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = WorkflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().trim_start_matches('@').to_lowercase();
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == wanted)
            .ok_or_else(|| WorkflowError::UnknownRole {
                name: s.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_registry_order_matches_roles() {
        for role in Role::ALL {
            assert_eq!(role.spec().role, role);
        }
    }

    #[test]
    fn test_qa_commands() {
        assert!(Role::Qa.accepts("*gate"));
        assert!(!Role::Dev.accepts("*gate"));
    }

    #[test]
    fn test_command_not_allowed_lists_allowed_set() {
        let err = Role::Dev.check_command("*gate").unwrap_err();
        match err {
            WorkflowError::CommandNotAllowed { allowed, .. } => {
                assert_eq!(allowed, vec!["*implement", "*code", "*test"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_keyword_routing() {
        assert_eq!(Role::for_task_type("Market Research"), Role::Analyst);
        assert_eq!(Role::for_task_type("ui design pass"), Role::Architect);
        assert_eq!(Role::for_task_type("regression testing"), Role::Qa);
        assert_eq!(Role::for_task_type("something else"), Role::Pm);
    }

    #[test]
    fn test_parse_role() {
        assert_eq!(Role::from_str("QA").unwrap(), Role::Qa);
        assert_eq!(Role::from_str("@dev").unwrap(), Role::Dev);
        assert!(matches!(
            Role::from_str("serena"),
            Err(WorkflowError::UnknownRole { .. })
        ));
    }

    #[test]
    fn test_roles_for_shared_project_state() {
        assert_eq!(
            roles_for_project_state(ProjectState::TestStrategy),
            vec![Role::Architect, Role::Qa]
        );
        assert_eq!(
            roles_for_story_state(StoryState::Development),
            vec![Role::Architect, Role::Dev]
        );
    }

    #[test]
    fn test_responsible_role_is_first_registered_owner() {
        for state in ProjectState::ALL {
            assert_eq!(
                state.responsible_role(),
                roles_for_project_state(state).first().copied(),
                "{state}"
            );
        }
        for state in StoryState::ALL {
            assert_eq!(
                state.responsible_role(),
                roles_for_story_state(state).first().copied(),
                "{state}"
            );
        }
    }
}
