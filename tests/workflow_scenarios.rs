//! End-to-end workflow scenarios driven through the public engine API.

use cadence::config::WorkflowConfig;
use cadence::engine::{RecordStatus, WorkflowEngine, WorkflowEventKind, WorkflowType};
use cadence::gates::{CertificationLevel, GateCommand, GateOutcome, QualityLevel};
use cadence::models::{ArtifactSlot, ProjectState, StoryState, StoryUpdate};
use cadence::WorkflowError;
use serde_json::json;
use std::sync::{Arc, Mutex};

fn engine() -> WorkflowEngine {
    WorkflowEngine::in_memory(&WorkflowConfig::default())
}

fn ready_workflow(engine: &mut WorkflowEngine) -> String {
    let workflow_id = engine
        .start_project_workflow("Checkout Redesign", Some("one-page checkout"), WorkflowType::Full)
        .unwrap()
        .workflow_id;
    for (state, slot) in [
        ("analyst_research", ArtifactSlot::Research),
        ("project_brief", ArtifactSlot::Brief),
        ("prd_creation", ArtifactSlot::Prd),
        ("architecture", ArtifactSlot::Architecture),
        ("master_checklist", ArtifactSlot::MasterChecklist),
    ] {
        engine.advance_workflow(&workflow_id, Some(state), None).unwrap();
        engine
            .set_project_artifact(&workflow_id, slot, format!("{slot} v1"))
            .unwrap();
    }
    engine.advance_workflow(&workflow_id, Some("alignment"), None).unwrap();
    engine
        .advance_workflow(&workflow_id, Some("development_ready"), None)
        .unwrap();
    workflow_id
}

fn specified_story(engine: &mut WorkflowEngine, workflow_id: &str) -> String {
    let story_id = engine
        .start_story_cycle(workflow_id, "Cart totals", None, Some("epic-checkout"))
        .unwrap()
        .story_id;
    engine
        .update_story(
            workflow_id,
            &story_id,
            StoryUpdate {
                description: Some(
                    "Customers can see the cart total including tax and shipping before paying."
                        .into(),
                ),
                acceptance_criteria: Some(vec![
                    "Total includes tax".into(),
                    "Total includes shipping".into(),
                ]),
                tasks: Some(vec!["Compute totals".into()]),
            },
        )
        .unwrap();
    story_id
}

#[test]
fn scenario_new_project_starts_at_idea_generation() {
    let mut engine = engine();

    let started = engine
        .start_project_workflow("Checkout Redesign", None, WorkflowType::Full)
        .unwrap();

    assert_eq!(started.state, ProjectState::IdeaGeneration);
    let actions: Vec<&str> = started.next_steps.iter().map(|s| s.action.as_str()).collect();
    assert!(actions.contains(&"advance_to_analyst_research"));
    assert!(actions.contains(&"advance_to_project_brief"));
}

#[test]
fn scenario_skipping_to_architecture_is_rejected() {
    let mut engine = engine();
    let workflow_id = engine
        .start_project_workflow("Checkout Redesign", None, WorkflowType::Full)
        .unwrap()
        .workflow_id;

    let err = engine
        .advance_workflow(&workflow_id, Some("architecture"), None)
        .unwrap_err();

    assert_eq!(
        err.legal_alternatives().unwrap(),
        ["analyst_research".to_string(), "project_brief".to_string()]
    );
    assert_eq!(
        engine.record(&workflow_id).unwrap().current_state,
        ProjectState::IdeaGeneration
    );
}

#[test]
fn scenario_story_during_planning_is_rejected() {
    let mut engine = engine();
    let workflow_id = engine
        .start_project_workflow("Checkout Redesign", Some("idea"), WorkflowType::Full)
        .unwrap()
        .workflow_id;
    engine.advance_workflow(&workflow_id, Some("project_brief"), None).unwrap();
    engine
        .set_project_artifact(&workflow_id, ArtifactSlot::Brief, "brief")
        .unwrap();
    engine.advance_workflow(&workflow_id, Some("prd_creation"), None).unwrap();

    let err = engine
        .start_story_cycle(&workflow_id, "Too early", None, None)
        .unwrap_err();

    let WorkflowError::WrongProjectState { state, .. } = err else {
        panic!("Expected WrongProjectState, got {err:?}");
    };
    assert_eq!(state, "prd_creation");
}

#[test]
fn scenario_story_without_criteria_fails_qa_check() {
    let mut engine = engine();
    let workflow_id = ready_workflow(&mut engine);
    let story_id = specified_story(&mut engine, &workflow_id);
    engine
        .advance_workflow(&workflow_id, Some("story_development"), None)
        .unwrap();
    engine
        .update_story(
            &workflow_id,
            &story_id,
            StoryUpdate {
                acceptance_criteria: Some(Vec::new()),
                ..StoryUpdate::default()
            },
        )
        .unwrap();

    let err = engine
        .advance_workflow(&workflow_id, Some("story_qa_check"), None)
        .unwrap_err();

    let verdict = err.verdict().expect("gate errors carry a verdict");
    assert_eq!(verdict.level, QualityLevel::Failed);
    assert!(verdict
        .issues
        .contains(&"No acceptance criteria defined".to_string()));
    assert_eq!(
        engine.orchestrator().story(&story_id).unwrap().state,
        StoryState::Development
    );
}

#[test]
fn scenario_fully_specified_story_reaches_completion() {
    let mut engine = engine();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    engine.on_all(Box::new(move |event| {
        sink.lock().unwrap().push(event.kind);
        Ok(())
    }));

    let workflow_id = ready_workflow(&mut engine);
    let story_id = specified_story(&mut engine, &workflow_id);
    engine
        .run_quality_gate(&workflow_id, &story_id, GateCommand::Design)
        .unwrap();

    let mut levels = Vec::new();
    for target in ["story_development", "story_qa_check"] {
        levels.push(engine.advance_workflow(&workflow_id, Some(target), None).unwrap());
    }
    engine.complete_task(&workflow_id, &story_id, 0).unwrap();
    for target in ["story_ready_for_review", "story_qa_review", "story_quality_gate"] {
        levels.push(engine.advance_workflow(&workflow_id, Some(target), None).unwrap());
    }
    engine
        .record_validation(&workflow_id, &story_id, "stakeholder_approved", json!(true))
        .unwrap();
    levels.push(
        engine
            .advance_workflow(&workflow_id, Some("story_completed"), None)
            .unwrap(),
    );

    for advance in &levels {
        let verdict = match advance {
            cadence::engine::WorkflowAdvance::Story(a) => &a.verdict,
            cadence::engine::WorkflowAdvance::Project(a) => &a.verdict,
        };
        assert!(verdict.level.allows_commit(), "{verdict:?}");
    }
    assert_eq!(
        engine.orchestrator().story(&story_id).unwrap().state,
        StoryState::Completed
    );

    let GateOutcome::Gate(assessment) = engine
        .run_quality_gate(&workflow_id, &story_id, GateCommand::Gate)
        .unwrap()
    else {
        panic!("Expected a gate assessment");
    };
    assert!(matches!(
        assessment.certification,
        CertificationLevel::Full | CertificationLevel::Conditional
    ));
    let certificate = assessment.certificate.unwrap();
    assert!(certificate.id.starts_with(&format!("QC-{story_id}-")));

    engine.advance_workflow(&workflow_id, Some("completed"), None).unwrap();
    assert_eq!(
        engine.record(&workflow_id).unwrap().status,
        RecordStatus::Completed
    );
    assert!(seen
        .lock()
        .unwrap()
        .contains(&WorkflowEventKind::WorkflowCompleted));

    let report = engine.generate_workflow_report(&workflow_id).unwrap();
    assert_eq!(report.completion_percentage, 100.0);
    assert_eq!(report.stories_completed, 1);
    assert_eq!(report.gates.failed, 0);
}

#[test]
fn story_cannot_skip_to_completed() {
    let mut engine = engine();
    let workflow_id = ready_workflow(&mut engine);
    engine
        .start_story_cycle(&workflow_id, "Tiny", None, None)
        .unwrap();

    let err = engine
        .advance_workflow(&workflow_id, Some("story_completed"), None)
        .unwrap_err();
    assert!(matches!(err, WorkflowError::InvalidTransition { .. }));
}
