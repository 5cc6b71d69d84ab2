use super::*;
use crate::error::WorkflowError;
use crate::models::roles::Role;
use std::str::FromStr;

// =========================================================================
// ProjectState transitions
// =========================================================================

#[test]
fn test_idea_generation_next_states() {
    let legal = ProjectState::IdeaGeneration.valid_transitions();
    assert_eq!(
        legal,
        &[ProjectState::AnalystResearch, ProjectState::ProjectBrief]
    );
}

#[test]
fn test_project_default_target_is_first_legal() {
    let target = ProjectState::IdeaGeneration.resolve_target(None).unwrap();
    assert_eq!(target, ProjectState::AnalystResearch);
}

#[test]
fn test_project_skip_to_architecture_rejected_with_alternatives() {
    let err = ProjectState::IdeaGeneration
        .resolve_target(Some(ProjectState::Architecture))
        .unwrap_err();

    match err {
        WorkflowError::InvalidTransition { from, to, legal } => {
            assert_eq!(from, "idea_generation");
            assert_eq!(to, "architecture");
            assert_eq!(legal, vec!["analyst_research", "project_brief"]);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_project_transition_iff_legal() {
    for from in ProjectState::ALL {
        for to in ProjectState::ALL {
            let expected = from.valid_transitions().contains(&to);
            assert_eq!(from.resolve_target(Some(to)).is_ok(), expected, "{from} -> {to}");
        }
    }
}

#[test]
fn test_project_graph_is_monotonic() {
    for from in ProjectState::ALL {
        for to in from.valid_transitions() {
            assert!(*to > from, "{from} -> {to} moves backward");
        }
    }
}

#[test]
fn test_project_completed_is_terminal() {
    assert!(ProjectState::Completed.is_terminal());
    assert!(matches!(
        ProjectState::Completed.resolve_target(None),
        Err(WorkflowError::NoNextState { .. })
    ));
}

// =========================================================================
// StoryState transitions
// =========================================================================

#[test]
fn test_draft_next_states() {
    assert_eq!(
        StoryState::Draft.valid_transitions(),
        &[
            StoryState::RiskProfiling,
            StoryState::Validation,
            StoryState::Development
        ]
    );
}

#[test]
fn test_story_transition_iff_legal() {
    for from in StoryState::ALL {
        for to in StoryState::ALL {
            let expected = from.valid_transitions().contains(&to);
            match from.resolve_target(Some(to)) {
                Ok(target) => {
                    assert!(expected, "{from} -> {to} should be rejected");
                    assert_eq!(target, to);
                }
                Err(WorkflowError::InvalidTransition { legal, .. }) => {
                    assert!(!expected, "{from} -> {to} should be accepted");
                    let configured: Vec<String> = from
                        .valid_transitions()
                        .iter()
                        .map(|s| s.to_string())
                        .collect();
                    assert_eq!(legal, configured);
                }
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }
    }
}

#[test]
fn test_story_graph_only_moves_forward_except_unblock() {
    for from in StoryState::ALL {
        for to in from.valid_transitions() {
            if from == StoryState::Blocked || *to == StoryState::Blocked {
                continue;
            }
            assert!(*to > from, "{from} -> {to} moves backward");
        }
    }
}

#[test]
fn test_blocked_reachable_from_in_progress_states() {
    for state in StoryState::ALL {
        if state.is_in_progress() {
            assert!(state.can_transition_to(&StoryState::Blocked), "{state}");
        }
    }
    assert_eq!(
        StoryState::Blocked.valid_transitions(),
        &[StoryState::Development]
    );
}

#[test]
fn test_completed_story_has_no_exit() {
    assert!(StoryState::Completed.valid_transitions().is_empty());
    assert!(StoryState::Completed.is_terminal());
}

// =========================================================================
// Parsing and roles
// =========================================================================

#[test]
fn test_state_round_trip_through_str() {
    for state in ProjectState::ALL {
        assert_eq!(ProjectState::from_str(state.as_str()).unwrap(), state);
    }
    for state in StoryState::ALL {
        assert_eq!(StoryState::from_str(state.as_str()).unwrap(), state);
    }
}

#[test]
fn test_unknown_state_name_rejected() {
    assert!(matches!(
        ProjectState::from_str("shipping"),
        Err(WorkflowError::InvalidState { .. })
    ));
}

#[test]
fn test_responsible_roles() {
    assert_eq!(
        ProjectState::AnalystResearch.responsible_role(),
        Some(Role::Analyst)
    );
    assert_eq!(ProjectState::Architecture.responsible_role(), Some(Role::Architect));
    assert_eq!(StoryState::QualityGate.responsible_role(), Some(Role::Qa));
    // shared states go to the first claimant
    assert_eq!(StoryState::Development.responsible_role(), Some(Role::Architect));
    assert_eq!(ProjectState::TestStrategy.responsible_role(), Some(Role::Architect));
    assert_eq!(ProjectState::MasterChecklist.responsible_role(), Some(Role::Pm));
    assert_eq!(ProjectState::Alignment.responsible_role(), None);
}

#[test]
fn test_story_session_phase() {
    assert_eq!(
        StoryState::QaCheck.session_phase(),
        WorkflowPhase::QualityAssurance
    );
    assert_eq!(StoryState::QaReview.session_phase(), WorkflowPhase::Review);
    assert_eq!(StoryState::Draft.session_phase(), WorkflowPhase::Development);
}
