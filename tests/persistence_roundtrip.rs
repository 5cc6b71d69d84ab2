//! File-backed persistence: every mutation is written and a fresh engine
//! reloads the same state.

use cadence::config::WorkflowConfig;
use cadence::engine::{EventLog, WorkflowEngine, WorkflowEventKind, WorkflowType};
use cadence::fs::{FileStore, WorkflowStore};
use cadence::models::{ArtifactSlot, ProjectState};
use tempfile::TempDir;

fn open(dir: &TempDir) -> WorkflowEngine {
    WorkflowEngine::open(
        &WorkflowConfig::default(),
        Box::new(FileStore::new(dir.path().join("store"))),
    )
    .unwrap()
}

#[test]
fn test_reload_yields_identical_state() {
    let temp = TempDir::new().unwrap();
    let mut engine = open(&temp);
    let workflow_id = engine
        .start_project_workflow("Checkout Redesign", Some("one-page checkout"), WorkflowType::Full)
        .unwrap()
        .workflow_id;
    engine.advance_workflow(&workflow_id, Some("project_brief"), None).unwrap();
    engine
        .set_project_artifact(&workflow_id, ArtifactSlot::Brief, "brief v1")
        .unwrap();
    engine.advance_workflow(&workflow_id, None, None).unwrap();

    let reloaded = open(&temp);

    let before = engine.snapshot(&workflow_id).unwrap();
    let after = reloaded.snapshot(&workflow_id).unwrap();
    assert_eq!(after.project.state, ProjectState::PrdCreation);
    assert_eq!(after.project.state, before.project.state);
    assert_eq!(
        after.session.as_ref().map(|s| s.current_step.clone()),
        before.session.as_ref().map(|s| s.current_step.clone())
    );
    assert_eq!(after.project.stories, before.project.stories);
    assert_eq!(after, before);
}

#[test]
fn test_store_holds_one_file_per_workflow() {
    let temp = TempDir::new().unwrap();
    let mut engine = open(&temp);
    let first = engine
        .start_project_workflow("First", None, WorkflowType::PlanningOnly)
        .unwrap()
        .workflow_id;
    let second = engine
        .start_project_workflow("Second", None, WorkflowType::DevelopmentOnly)
        .unwrap()
        .workflow_id;

    let store = FileStore::new(temp.path().join("store"));
    let mut keys = store.list_keys().unwrap();
    keys.sort();
    let mut expected = vec![first.clone(), second];
    expected.sort();
    assert_eq!(keys, expected);

    let snapshot = store.get(&first).unwrap().unwrap();
    assert_eq!(snapshot.record.workflow_type, WorkflowType::PlanningOnly);
    assert!(store.get("workflow-missing").unwrap().is_none());
}

#[test]
fn test_missing_session_is_reconstructed() {
    let temp = TempDir::new().unwrap();
    let mut engine = open(&temp);
    let workflow_id = engine
        .start_project_workflow("Checkout Redesign", Some("idea"), WorkflowType::Full)
        .unwrap()
        .workflow_id;
    engine.advance_workflow(&workflow_id, None, None).unwrap();

    let mut store = FileStore::new(temp.path().join("store"));
    let mut snapshot = store.get(&workflow_id).unwrap().unwrap();
    snapshot.session = None;
    store.put(&workflow_id, &snapshot).unwrap();

    let reloaded = open(&temp);
    let project_id = &reloaded.record(&workflow_id).unwrap().project_id;
    let session = reloaded.orchestrator().session_for(project_id).unwrap();
    assert_eq!(session.current_step, "analyst_research");
    assert!(session.completed_actions.is_empty());
}

#[test]
fn test_event_log_survives_restart() {
    let temp = TempDir::new().unwrap();
    let log = EventLog::new(temp.path().join("events.jsonl"));

    let mut engine = open(&temp);
    engine.on_all(log.clone().listener());
    let workflow_id = engine
        .start_project_workflow("Checkout Redesign", None, WorkflowType::Full)
        .unwrap()
        .workflow_id;
    drop(engine);

    let mut engine = open(&temp);
    engine.on_all(log.clone().listener());
    engine.advance_workflow(&workflow_id, None, None).unwrap();

    let kinds: Vec<WorkflowEventKind> = log.read_recent(10).unwrap().iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        [
            WorkflowEventKind::ProjectCreated,
            WorkflowEventKind::ProjectStateChanged
        ]
    );
}
