use super::*;
use crate::config::WorkflowConfig;
use crate::error::WorkflowError;
use crate::gates::{GateCommand, GateOutcome, QualityLevel};
use crate::models::project::ArtifactSlot;
use crate::models::roles::Role;
use crate::models::session::ActionKind;
use crate::models::state::{ProjectState, StoryState, WorkflowPhase};
use crate::models::story::StoryUpdate;
use serde_json::json;

fn orchestrator() -> Orchestrator {
    Orchestrator::new(&WorkflowConfig::default())
}

/// Drive a fresh project to `development_ready`, filling artifacts on the way.
fn ready_project(orch: &mut Orchestrator) -> String {
    let id = orch.create_project("Checkout Redesign", Some("one-page checkout")).project_id;
    let steps = [
        (ProjectState::AnalystResearch, ArtifactSlot::Research),
        (ProjectState::ProjectBrief, ArtifactSlot::Brief),
        (ProjectState::PrdCreation, ArtifactSlot::Prd),
        (ProjectState::Architecture, ArtifactSlot::Architecture),
        (ProjectState::MasterChecklist, ArtifactSlot::MasterChecklist),
    ];
    for (state, slot) in steps {
        orch.advance_project_state(&id, Some(state))
            .expect("Should advance through planning");
        orch.set_project_artifact(&id, slot, format!("{slot} done")).unwrap();
    }
    orch.advance_project_state(&id, Some(ProjectState::Alignment)).unwrap();
    orch.advance_project_state(&id, Some(ProjectState::DevelopmentReady))
        .unwrap();
    id
}

fn specified_story(orch: &mut Orchestrator, project_id: &str) -> String {
    let story_id = orch
        .create_story(project_id, "Cart totals", None, Some("epic-1"))
        .unwrap()
        .story_id;
    orch.update_story(
        &story_id,
        StoryUpdate {
            description: Some(
                "Customers can see the cart total including tax and shipping before paying."
                    .into(),
            ),
            acceptance_criteria: Some(vec!["includes tax".into(), "includes shipping".into()]),
            tasks: Some(vec!["compute totals".into()]),
        },
    )
    .unwrap();
    story_id
}

// =========================================================================
// Projects
// =========================================================================

#[test]
fn test_create_project_without_idea() {
    let mut orch = orchestrator();
    let created = orch.create_project("Checkout Redesign", None);

    assert_eq!(created.state, ProjectState::IdeaGeneration);
    assert!(created.next_states.contains(&ProjectState::AnalystResearch));
    assert!(created.next_states.contains(&ProjectState::ProjectBrief));
    assert!(created.project_id.starts_with("proj-"));
    assert_eq!(created.session_id, format!("{}-session-001", created.project_id));
    assert!(orch.session_for(&created.project_id).is_some());
}

#[test]
fn test_default_target_is_first_legal_state() {
    let mut orch = orchestrator();
    let id = orch.create_project("p", None).project_id;
    let advance = orch.advance_project_state(&id, None).unwrap();
    assert_eq!(advance.to, ProjectState::AnalystResearch);
    assert_eq!(
        orch.session_for(&id).unwrap().current_step,
        "analyst_research"
    );
}

#[test]
fn test_illegal_project_target_lists_alternatives() {
    let mut orch = orchestrator();
    let id = orch.create_project("p", None).project_id;

    let err = orch
        .advance_project_state(&id, Some(ProjectState::Architecture))
        .unwrap_err();

    assert_eq!(
        err.legal_alternatives().unwrap(),
        &["analyst_research".to_string(), "project_brief".to_string()]
    );
    assert_eq!(orch.project(&id).unwrap().state, ProjectState::IdeaGeneration);
}

#[test]
fn test_missing_prerequisite_reports_slot() {
    let mut orch = orchestrator();
    let id = orch.create_project("p", None).project_id;

    let err = orch
        .advance_project_state(&id, Some(ProjectState::ProjectBrief))
        .unwrap_err();

    match err {
        WorkflowError::PrerequisiteUnmet { missing, .. } => {
            assert_eq!(missing, vec![ArtifactSlot::Idea]);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(orch.project(&id).unwrap().state, ProjectState::IdeaGeneration);
}

#[test]
fn test_unknown_project_not_found() {
    let mut orch = orchestrator();
    assert!(matches!(
        orch.advance_project_state("proj-missing", None),
        Err(WorkflowError::NotFound { .. })
    ));
}

#[test]
fn test_project_completion_waits_for_stories() {
    let mut orch = orchestrator();
    let id = ready_project(&mut orch);
    orch.create_story(&id, "open story", None, None).unwrap();

    let err = orch
        .advance_project_state(&id, Some(ProjectState::Completed))
        .unwrap_err();

    assert!(matches!(err, WorkflowError::GateFailed { .. }));
    assert_eq!(orch.project(&id).unwrap().state, ProjectState::InDevelopment);
}

// =========================================================================
// Stories
// =========================================================================

#[test]
fn test_story_rejected_during_planning() {
    let mut orch = orchestrator();
    let id = orch.create_project("p", Some("idea")).project_id;
    orch.advance_project_state(&id, Some(ProjectState::ProjectBrief))
        .unwrap();

    let err = orch.create_story(&id, "too early", None, None).unwrap_err();

    assert!(matches!(err, WorkflowError::WrongProjectState { .. }));
    assert!(orch.project(&id).unwrap().stories.is_empty());
}

#[test]
fn test_first_story_promotes_project() {
    let mut orch = orchestrator();
    let id = ready_project(&mut orch);

    let created = orch.create_story(&id, "first", None, None).unwrap();

    assert!(created.project_promoted);
    assert_eq!(created.story_id, format!("{id}-story-001"));
    assert_eq!(orch.project(&id).unwrap().state, ProjectState::InDevelopment);

    let second = orch.create_story(&id, "second", None, None).unwrap();
    assert!(!second.project_promoted);
    assert_eq!(second.story_id, format!("{id}-story-002"));
}

#[test]
fn test_failed_gate_leaves_story_untouched() {
    let mut orch = orchestrator();
    let id = ready_project(&mut orch);
    let story_id = orch.create_story(&id, "bare", None, None).unwrap().story_id;
    orch.advance_story_state(&story_id, Some(StoryState::RiskProfiling))
        .unwrap();
    orch.advance_story_state(&story_id, Some(StoryState::Development))
        .unwrap_err();

    let err = orch
        .advance_story_state(&story_id, Some(StoryState::Validation))
        .and_then(|_| orch.advance_story_state(&story_id, Some(StoryState::Development)))
        .unwrap_err();

    assert!(matches!(err, WorkflowError::GateBlocked { .. }));
    assert_eq!(orch.story(&story_id).unwrap().state, StoryState::Validation);
    assert_eq!(
        orch.project(&id).unwrap().stories[0].state,
        StoryState::Validation
    );
}

#[test]
fn test_story_transition_propagates_to_project() {
    let mut orch = orchestrator();
    let id = ready_project(&mut orch);
    let story_id = specified_story(&mut orch, &id);

    let advance = orch
        .advance_story_state(&story_id, Some(StoryState::Development))
        .unwrap();

    assert_eq!(advance.verdict.level, QualityLevel::Passed);
    assert_eq!(orch.project(&id).unwrap().stories[0].state, StoryState::Development);
    let session = orch.session_for(&id).unwrap();
    assert_eq!(session.active_story.as_deref(), Some(story_id.as_str()));
    assert_eq!(session.phase, WorkflowPhase::Development);
}

#[test]
fn test_complete_task_out_of_range() {
    let mut orch = orchestrator();
    let id = ready_project(&mut orch);
    let story_id = specified_story(&mut orch, &id);
    assert!(matches!(
        orch.complete_task(&story_id, 7),
        Err(WorkflowError::NotFound { .. })
    ));
    orch.complete_task(&story_id, 0).unwrap();
}

#[test]
fn test_gate_command_logged_on_session() {
    let mut orch = orchestrator();
    let id = ready_project(&mut orch);
    let story_id = specified_story(&mut orch, &id);

    let outcome = orch.run_gate_command(&story_id, GateCommand::Risk).unwrap();

    assert!(matches!(outcome, GateOutcome::Risk(_)));
    assert!(orch.story(&story_id).unwrap().risk_profile.is_some());
    assert_eq!(orch.metrics().role_interactions.get(&Role::Qa), Some(&1));
}

#[test]
fn test_evidence_feeds_gates() {
    let mut orch = orchestrator();
    let id = ready_project(&mut orch);
    let story_id = specified_story(&mut orch, &id);
    orch.advance_story_state(&story_id, Some(StoryState::Development))
        .unwrap();
    orch.record_validation(&story_id, "test_failures", json!(3))
        .unwrap();

    let err = orch
        .advance_story_state(&story_id, Some(StoryState::QaCheck))
        .unwrap_err();

    let verdict = err.verdict().unwrap();
    assert_eq!(verdict.level, QualityLevel::Blocked);
    assert_eq!(orch.story(&story_id).unwrap().state, StoryState::Development);
}

// =========================================================================
// Routing
// =========================================================================

#[test]
fn test_assignment_follows_project_state_owner() {
    let mut orch = orchestrator();
    let id = orch.create_project("p", Some("idea")).project_id;
    orch.advance_project_state(&id, Some(ProjectState::ProjectBrief)).unwrap();
    orch.set_project_artifact(&id, ArtifactSlot::Brief, "brief").unwrap();
    orch.advance_project_state(&id, Some(ProjectState::PrdCreation)).unwrap();
    orch.set_project_artifact(&id, ArtifactSlot::Prd, "prd").unwrap();
    orch.advance_project_state(&id, Some(ProjectState::Architecture)).unwrap();

    let assignment = orch.assign_agent_to_task(&id, "write docs", None, None).unwrap();

    assert_eq!(assignment.role, Role::Architect);
    assert_eq!(
        orch.project(&id).unwrap().assigned_roles.get("write docs"),
        Some(&Role::Architect)
    );
}

#[test]
fn test_assignment_follows_story_state_owner() {
    let mut orch = orchestrator();
    let id = ready_project(&mut orch);
    let story_id = specified_story(&mut orch, &id);

    // the story sits in draft, owned by the PM, whatever the keyword says
    let assignment = orch
        .assign_agent_to_task(&id, "regression testing", Some(&story_id), None)
        .unwrap();

    assert_eq!(assignment.role, Role::Pm);
    assert_eq!(
        orch.story(&story_id).unwrap().assigned_roles.get("regression testing"),
        Some(&Role::Pm)
    );
}

#[test]
fn test_assignment_falls_back_to_keywords() {
    let mut orch = orchestrator();
    let id = orch.create_project("p", None).project_id;

    // idea_generation has no owner
    let architecture = orch
        .assign_agent_to_task(&id, "architecture", None, None)
        .unwrap();
    assert_eq!(architecture.role, Role::Architect);

    let by_keyword = orch
        .assign_agent_to_task(&id, "market research", None, None)
        .unwrap();
    assert_eq!(by_keyword.role, Role::Analyst);

    let session = orch.session_for(&id).unwrap();
    assert_eq!(session.pending_actions.len(), 2);
    assert_eq!(session.active_role, Some(Role::Analyst));
}

#[test]
fn test_command_outside_role_rejected() {
    let mut orch = orchestrator();
    let id = orch.create_project("p", None).project_id;

    let err = orch
        .route_agent_command(&id, "dev", "*gate", None)
        .unwrap_err();

    match err {
        WorkflowError::CommandNotAllowed { role, allowed, .. } => {
            assert_eq!(role, Role::Dev);
            assert!(allowed.contains(&"*implement".to_string()));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(orch.session_for(&id).unwrap().completed_actions.is_empty());
}

#[test]
fn test_unknown_role_rejected() {
    let mut orch = orchestrator();
    let id = orch.create_project("p", None).project_id;
    assert!(matches!(
        orch.route_agent_command(&id, "@designer", "*draw", None),
        Err(WorkflowError::UnknownRole { .. })
    ));
}

#[test]
fn test_routed_command_predicts_outcome() {
    let mut orch = orchestrator();
    let id = orch.create_project("p", None).project_id;
    let route = orch
        .route_agent_command(&id, "@analyst", "*research", None)
        .unwrap();
    assert_eq!(route.expected_outcome.as_deref(), Some("research_completed"));
}

#[test]
fn test_routed_command_closes_assignment() {
    let mut orch = orchestrator();
    let id = orch.create_project("p", None).project_id;
    orch.assign_agent_to_task(&id, "market research", None, None)
        .unwrap();
    assert_eq!(orch.session_for(&id).unwrap().pending_actions.len(), 1);

    orch.route_agent_command(&id, "analyst", "*research", None)
        .unwrap();

    let session = orch.session_for(&id).unwrap();
    assert!(session.pending_actions.is_empty());
    assert_eq!(session.completed_actions[0].kind, ActionKind::Assignment);
}

// =========================================================================
// Status and restore
// =========================================================================

#[test]
fn test_status_is_idempotent() {
    let mut orch = orchestrator();
    let id = ready_project(&mut orch);
    specified_story(&mut orch, &id);

    let first = orch.get_workflow_status(Some(&id)).unwrap();
    let second = orch.get_workflow_status(Some(&id)).unwrap();
    assert_eq!(first, second);

    match first {
        WorkflowStatus::Project(status) => {
            assert_eq!(status.stories.len(), 1);
            assert_eq!(status.project.state, ProjectState::InDevelopment);
        }
        other => panic!("unexpected status: {other:?}"),
    }
}

#[test]
fn test_status_for_all_projects() {
    let mut orch = orchestrator();
    orch.create_project("a", None);
    orch.create_project("b", None);
    match orch.get_workflow_status(None).unwrap() {
        WorkflowStatus::All { projects } => assert_eq!(projects.len(), 2),
        other => panic!("unexpected status: {other:?}"),
    }
}

#[test]
fn test_restore_rebuilds_missing_session() {
    let mut source = orchestrator();
    let id = ready_project(&mut source);
    let story_id = specified_story(&mut source, &id);
    source
        .advance_story_state(&story_id, Some(StoryState::Development))
        .unwrap();

    let project = source.project(&id).unwrap().clone();
    let stories = source
        .stories_for(&id)
        .into_iter()
        .cloned()
        .collect();

    let mut restored = orchestrator();
    restored.restore(project, stories, None);

    let session = restored.session_for(&id).unwrap();
    assert_eq!(session.active_story.as_deref(), Some(story_id.as_str()));
    assert_eq!(session.current_step, "story_development");
    assert_eq!(
        restored.story(&story_id).unwrap().state,
        StoryState::Development
    );
}
