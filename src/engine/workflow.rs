use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;
use tracing::{debug, info, warn};

use super::automation::{AutomationAction, AutomationEvent, AutomationRule};
use super::events::{EventBus, Listener, WorkflowEvent, WorkflowEventKind};
use super::plan::{ExecutionPlan, WorkflowType};
use super::record::{GateRun, RecordStatus, WorkflowRecord, WorkflowSnapshot};
use super::report::{build_report, WorkflowReport};
use crate::config::WorkflowConfig;
use crate::error::{EntityKind, Result, WorkflowError};
use crate::fs::store::{MemoryStore, WorkflowStore};
use crate::gates::{GateCommand, GateOutcome};
use crate::models::project::ArtifactSlot;
use crate::models::roles::Role;
use crate::models::state::{ProjectState, StoryState};
use crate::models::story::StoryUpdate;
use crate::orchestrator::{
    project_next_steps, Assignment, CommandRoute, NextStep, Orchestrator, OrchestratorMetrics,
    ProjectAdvance, StoryAdvance, StoryCreated, WorkflowStatus,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineMetrics {
    pub workflows_started: u64,
    pub advancements: u64,
    pub agent_commands: u64,
    pub quality_gates_run: u64,
    pub automation_triggers: u64,
    pub events_fired: u64,
    pub listener_failures: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowStarted {
    pub workflow_id: String,
    pub project_id: String,
    pub session_id: String,
    pub workflow_type: WorkflowType,
    pub state: ProjectState,
    pub plan: ExecutionPlan,
    pub next_steps: Vec<NextStep>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "level", rename_all = "snake_case")]
pub enum WorkflowAdvance {
    Project(ProjectAdvance),
    Story(StoryAdvance),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentCommandResult {
    pub route: CommandRoute,
    /// Set when a QA command ran against a story.
    pub gate: Option<GateOutcome>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowSummary {
    pub workflow_id: String,
    pub project_id: String,
    pub workflow_type: WorkflowType,
    pub status: RecordStatus,
    pub current_state: ProjectState,
    pub current_story_id: Option<String>,
}

impl From<&WorkflowRecord> for WorkflowSummary {
    fn from(record: &WorkflowRecord) -> Self {
        Self {
            workflow_id: record.workflow_id.clone(),
            project_id: record.project_id.clone(),
            workflow_type: record.workflow_type,
            status: record.status,
            current_state: record.current_state,
            current_story_id: record.current_story_id.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum EngineStatus {
    Workflow {
        record: Box<WorkflowRecord>,
        status: WorkflowStatus,
    },
    Overview {
        workflows: Vec<WorkflowSummary>,
        metrics: EngineMetrics,
        orchestrator: OrchestratorMetrics,
        automation_rules: usize,
        unflushed: Vec<String>,
    },
}

/// Workflow engine: orchestrator plus persistence, events and automation.
///
/// Every mutating operation persists the affected workflow, publishes its
/// events and then evaluates automation rules. A persistence failure is
/// returned to the caller after the in-memory change has been applied; the
/// workflow stays dirty until a later write or [`WorkflowEngine::flush`]
/// succeeds.
pub struct WorkflowEngine {
    orchestrator: Orchestrator,
    store: Box<dyn WorkflowStore>,
    records: BTreeMap<String, WorkflowRecord>,
    rules: Vec<AutomationRule>,
    bus: EventBus,
    dirty: BTreeSet<String>,
    max_depth: usize,
    automation_depth: usize,
    metrics: EngineMetrics,
}

impl WorkflowEngine {
    /// Open an engine over a store, reloading every stored workflow.
    pub fn open(config: &WorkflowConfig, store: Box<dyn WorkflowStore>) -> anyhow::Result<Self> {
        let mut engine = Self::with_parts(Orchestrator::new(config), store, config);
        engine.reload()?;
        Ok(engine)
    }

    /// Engine over a fresh in-memory store.
    pub fn in_memory(config: &WorkflowConfig) -> Self {
        Self::with_parts(
            Orchestrator::new(config),
            Box::new(MemoryStore::new()),
            config,
        )
    }

    /// Assemble an engine around a preconfigured orchestrator, e.g. one
    /// with a custom risk scorer. Stored workflows are not reloaded.
    pub fn with_parts(
        orchestrator: Orchestrator,
        store: Box<dyn WorkflowStore>,
        config: &WorkflowConfig,
    ) -> Self {
        Self {
            orchestrator,
            store,
            records: BTreeMap::new(),
            rules: Vec::new(),
            bus: EventBus::new(),
            dirty: BTreeSet::new(),
            max_depth: config.automation.max_depth,
            automation_depth: 0,
            metrics: EngineMetrics::default(),
        }
    }

    fn reload(&mut self) -> anyhow::Result<()> {
        use anyhow::Context;

        for key in self.store.list_keys()? {
            let snapshot = self
                .store
                .get(&key)
                .with_context(|| format!("Failed to load workflow {key}"))?;
            let Some(WorkflowSnapshot {
                record,
                project,
                session,
                stories,
            }) = snapshot
            else {
                continue;
            };
            self.orchestrator.restore(project, stories, session);
            self.records.insert(record.workflow_id.clone(), record);
        }
        info!(workflows = self.records.len(), "Workflows loaded");
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Accessors
    // ---------------------------------------------------------------------

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    pub fn record(&self, workflow_id: &str) -> Result<&WorkflowRecord> {
        self.records
            .get(workflow_id)
            .ok_or_else(|| WorkflowError::not_found(EntityKind::Workflow, workflow_id))
    }

    pub fn records(&self) -> impl Iterator<Item = &WorkflowRecord> {
        self.records.values()
    }

    pub fn metrics(&self) -> &EngineMetrics {
        &self.metrics
    }

    /// Workflows whose last write failed.
    pub fn unflushed(&self) -> impl Iterator<Item = &String> {
        self.dirty.iter()
    }

    pub fn on(&mut self, kind: WorkflowEventKind, listener: Listener) {
        self.bus.subscribe(kind, listener);
    }

    pub fn on_all(&mut self, listener: Listener) {
        self.bus.subscribe_all(listener);
    }

    pub fn add_automation_rule(&mut self, rule: AutomationRule) {
        debug!(rule = %rule.name, action = %rule.action, "Automation rule added");
        self.rules.push(rule);
    }

    fn record_mut(&mut self, workflow_id: &str) -> Result<&mut WorkflowRecord> {
        self.records
            .get_mut(workflow_id)
            .ok_or_else(|| WorkflowError::not_found(EntityKind::Workflow, workflow_id))
    }

    fn project_of(&self, workflow_id: &str) -> Result<String> {
        Ok(self.record(workflow_id)?.project_id.clone())
    }

    /// Resolve a story that must belong to the workflow's project.
    fn story_of(&self, workflow_id: &str, story_id: &str) -> Result<String> {
        let project_id = self.project_of(workflow_id)?;
        match self.orchestrator.story(story_id) {
            Some(story) if story.project_id == project_id => Ok(project_id),
            _ => Err(WorkflowError::not_found(EntityKind::Story, story_id)),
        }
    }

    // ---------------------------------------------------------------------
    // Workflow operations
    // ---------------------------------------------------------------------

    pub fn start_project_workflow(
        &mut self,
        name: &str,
        idea: Option<&str>,
        workflow_type: WorkflowType,
    ) -> Result<WorkflowStarted> {
        let created = self.orchestrator.create_project(name, idea);
        let record = WorkflowRecord::new(
            &created.project_id,
            &created.session_id,
            workflow_type,
            created.state,
        );
        let workflow_id = record.workflow_id.clone();
        let plan = record.plan.clone();
        self.records.insert(workflow_id.clone(), record);
        self.metrics.workflows_started += 1;
        info!(workflow_id = %workflow_id, project_id = %created.project_id, workflow_type = %workflow_type, "Workflow started");

        self.fire(
            WorkflowEvent::new(WorkflowEventKind::ProjectCreated, &workflow_id, &created.project_id)
                .with_data(json!({
                    "name": name,
                    "workflow_type": workflow_type,
                    "state": created.state,
                })),
        );
        self.settle(&workflow_id)?;

        Ok(WorkflowStarted {
            workflow_id,
            project_id: created.project_id,
            session_id: created.session_id,
            workflow_type,
            state: created.state,
            plan,
            next_steps: project_next_steps(created.state),
        })
    }

    /// Advance the project, or the current story when `target` is `story`
    /// or `story_<state>`.
    pub fn advance_workflow(
        &mut self,
        workflow_id: &str,
        target: Option<&str>,
        agent_override: Option<Role>,
    ) -> Result<WorkflowAdvance> {
        let advance = match target {
            Some(t) if t == "story" || t.starts_with("story_") => {
                let story_target = t
                    .strip_prefix("story_")
                    .map(StoryState::from_str)
                    .transpose()?;
                self.advance_story(workflow_id, story_target, agent_override)?
            }
            _ => {
                let project_target = target.map(ProjectState::from_str).transpose()?;
                self.advance_project(workflow_id, project_target, agent_override)?
            }
        };

        self.metrics.advancements += 1;
        self.settle(workflow_id)?;
        Ok(advance)
    }

    fn advance_project(
        &mut self,
        workflow_id: &str,
        target: Option<ProjectState>,
        agent_override: Option<Role>,
    ) -> Result<WorkflowAdvance> {
        let project_id = self.project_of(workflow_id)?;
        let advance = match self.orchestrator.advance_project_state(&project_id, target) {
            Ok(advance) => advance,
            Err(e) => return Err(self.settle_rejection(workflow_id, e)),
        };

        self.record_mut(workflow_id)?.project_moved(advance.to);
        self.fire(
            WorkflowEvent::new(WorkflowEventKind::ProjectStateChanged, workflow_id, &project_id)
                .with_data(json!({
                    "from": advance.from,
                    "to": advance.to,
                    "level": advance.verdict.level,
                })),
        );
        if advance.to == ProjectState::Completed {
            info!(workflow_id, project_id = %project_id, "Workflow completed");
            self.fire(WorkflowEvent::new(
                WorkflowEventKind::WorkflowCompleted,
                workflow_id,
                &project_id,
            ));
        }
        if let Some(role) = agent_override {
            self.assign(workflow_id, advance.to.as_str(), None, Some(role))?;
        }
        Ok(WorkflowAdvance::Project(advance))
    }

    fn advance_story(
        &mut self,
        workflow_id: &str,
        target: Option<StoryState>,
        agent_override: Option<Role>,
    ) -> Result<WorkflowAdvance> {
        let record = self.record(workflow_id)?;
        let project_id = record.project_id.clone();
        let story_id = record
            .current_story_id
            .clone()
            .ok_or_else(|| WorkflowError::NoActiveStory {
                workflow_id: workflow_id.to_string(),
            })?;

        let advance = match self.orchestrator.advance_story_state(&story_id, target) {
            Ok(advance) => advance,
            Err(e) => return Err(self.settle_rejection(workflow_id, e)),
        };

        self.record_mut(workflow_id)?
            .story_moved(&story_id, advance.to);
        self.fire(
            WorkflowEvent::new(WorkflowEventKind::StoryStateChanged, workflow_id, &project_id)
                .with_story(&story_id)
                .with_data(json!({
                    "from": advance.from,
                    "to": advance.to,
                    "level": advance.verdict.level,
                })),
        );
        if let Some(role) = agent_override {
            self.assign(workflow_id, advance.to.as_str(), Some(&story_id), Some(role))?;
        }
        Ok(WorkflowAdvance::Story(advance))
    }

    /// Route a role command. QA commands naming a story also run the
    /// matching gate command against it.
    pub fn execute_agent_command(
        &mut self,
        workflow_id: &str,
        role: &str,
        command: &str,
        story_id: Option<&str>,
    ) -> Result<AgentCommandResult> {
        let project_id = match story_id {
            Some(story_id) => self.story_of(workflow_id, story_id)?,
            None => self.project_of(workflow_id)?,
        };
        let route = self
            .orchestrator
            .route_agent_command(&project_id, role, command, story_id)?;

        self.record_mut(workflow_id)?.engage(route.role);
        self.metrics.agent_commands += 1;
        let mut event =
            WorkflowEvent::new(WorkflowEventKind::AgentAssigned, workflow_id, &project_id)
                .with_data(json!({
                    "role": route.role,
                    "command": route.command,
                    "expected_outcome": route.expected_outcome,
                }));
        if let Some(story_id) = story_id {
            event = event.with_story(story_id);
        }
        self.fire(event);

        let gate = match (route.role, story_id) {
            (Role::Qa, Some(story_id)) => match GateCommand::from_str(command) {
                Ok(gate) => Some(self.gate_run(workflow_id, story_id, gate, true)?),
                Err(_) => None,
            },
            _ => None,
        };

        self.settle(workflow_id)?;
        Ok(AgentCommandResult { route, gate })
    }

    pub fn assign_agent(
        &mut self,
        workflow_id: &str,
        task_type: &str,
        story_id: Option<&str>,
        role: Option<Role>,
    ) -> Result<Assignment> {
        if let Some(story_id) = story_id {
            self.story_of(workflow_id, story_id)?;
        }
        let assignment = self.assign(workflow_id, task_type, story_id, role)?;
        self.settle(workflow_id)?;
        Ok(assignment)
    }

    fn assign(
        &mut self,
        workflow_id: &str,
        task_type: &str,
        story_id: Option<&str>,
        role: Option<Role>,
    ) -> Result<Assignment> {
        let project_id = self.project_of(workflow_id)?;
        let assignment = self
            .orchestrator
            .assign_agent_to_task(&project_id, task_type, story_id, role)?;
        self.record_mut(workflow_id)?.engage(assignment.role);

        let mut event =
            WorkflowEvent::new(WorkflowEventKind::AgentAssigned, workflow_id, &project_id)
                .with_data(json!({
                    "role": assignment.role,
                    "task_type": assignment.task_type,
                }));
        if let Some(story_id) = story_id {
            event = event.with_story(story_id);
        }
        self.fire(event);
        Ok(assignment)
    }

    pub fn run_quality_gate(
        &mut self,
        workflow_id: &str,
        story_id: &str,
        gate: GateCommand,
    ) -> Result<GateOutcome> {
        let outcome = self.gate_run(workflow_id, story_id, gate, false)?;
        self.settle(workflow_id)?;
        Ok(outcome)
    }

    /// `routed` gate runs ride on an agent command that already engaged QA.
    fn gate_run(
        &mut self,
        workflow_id: &str,
        story_id: &str,
        gate: GateCommand,
        routed: bool,
    ) -> Result<GateOutcome> {
        let project_id = self.story_of(workflow_id, story_id)?;
        let outcome = if routed {
            self.orchestrator.run_routed_gate_command(story_id, gate)?
        } else {
            self.orchestrator.run_gate_command(story_id, gate)?
        };

        let run = GateRun {
            story_id: story_id.to_string(),
            gate,
            passed: outcome.approved(),
            summary: outcome.summary(),
            timestamp: Utc::now(),
        };
        info!(workflow_id, story_id, gate = %gate, passed = ?run.passed, "Quality gate run");

        let data = json!({
            "gate_type": gate,
            "passed": run.passed,
            "summary": run.summary,
        });
        let record = self.record_mut(workflow_id)?;
        record.quality_gates.push(run);
        if !routed {
            record.engage(Role::Qa);
        }
        self.metrics.quality_gates_run += 1;
        self.fire(
            WorkflowEvent::new(WorkflowEventKind::QualityGateChecked, workflow_id, &project_id)
                .with_story(story_id)
                .with_data(data),
        );
        Ok(outcome)
    }

    /// Create a story and make it the workflow's current story.
    pub fn start_story_cycle(
        &mut self,
        workflow_id: &str,
        title: &str,
        description: Option<&str>,
        epic_id: Option<&str>,
    ) -> Result<StoryCreated> {
        let project_id = self.project_of(workflow_id)?;
        let created = self
            .orchestrator
            .create_story(&project_id, title, description, epic_id)?;

        let record = self.record_mut(workflow_id)?;
        record.current_story_id = Some(created.story_id.clone());
        record.current_story_state = Some(created.state);
        if created.project_promoted {
            record.project_moved(ProjectState::InDevelopment);
        }

        self.fire(
            WorkflowEvent::new(WorkflowEventKind::StoryCreated, workflow_id, &project_id)
                .with_story(&created.story_id)
                .with_data(json!({ "title": title, "state": created.state })),
        );
        if created.project_promoted {
            self.fire(
                WorkflowEvent::new(WorkflowEventKind::ProjectStateChanged, workflow_id, &project_id)
                    .with_data(json!({
                        "from": ProjectState::DevelopmentReady,
                        "to": ProjectState::InDevelopment,
                    })),
            );
        }
        self.settle(workflow_id)?;
        Ok(created)
    }

    /// Point `story_*` advancement at another story of the same project.
    pub fn focus_story(&mut self, workflow_id: &str, story_id: &str) -> Result<()> {
        self.story_of(workflow_id, story_id)?;
        let state = self.orchestrator.story(story_id).map(|s| s.state);
        let record = self.record_mut(workflow_id)?;
        record.current_story_id = Some(story_id.to_string());
        record.current_story_state = state;
        self.settle(workflow_id)
    }

    // ---------------------------------------------------------------------
    // Artifact producers
    // ---------------------------------------------------------------------

    pub fn set_project_artifact(
        &mut self,
        workflow_id: &str,
        slot: ArtifactSlot,
        value: impl Into<String>,
    ) -> Result<()> {
        let project_id = self.project_of(workflow_id)?;
        self.orchestrator
            .set_project_artifact(&project_id, slot, value)?;
        self.settle(workflow_id)
    }

    pub fn update_story(
        &mut self,
        workflow_id: &str,
        story_id: &str,
        update: StoryUpdate,
    ) -> Result<()> {
        self.story_of(workflow_id, story_id)?;
        self.orchestrator.update_story(story_id, update)?;
        self.settle(workflow_id)
    }

    pub fn complete_task(&mut self, workflow_id: &str, story_id: &str, index: usize) -> Result<()> {
        self.story_of(workflow_id, story_id)?;
        self.orchestrator.complete_task(story_id, index)?;
        self.settle(workflow_id)
    }

    pub fn record_validation(
        &mut self,
        workflow_id: &str,
        story_id: &str,
        key: &str,
        value: serde_json::Value,
    ) -> Result<()> {
        self.story_of(workflow_id, story_id)?;
        self.orchestrator.record_validation(story_id, key, value)?;
        self.settle(workflow_id)
    }

    // ---------------------------------------------------------------------
    // Read side
    // ---------------------------------------------------------------------

    pub fn get_workflow_status(&self, workflow_id: Option<&str>) -> Result<EngineStatus> {
        let Some(workflow_id) = workflow_id else {
            return Ok(EngineStatus::Overview {
                workflows: self.records.values().map(WorkflowSummary::from).collect(),
                metrics: self.metrics.clone(),
                orchestrator: self.orchestrator.metrics(),
                automation_rules: self.rules.len(),
                unflushed: self.dirty.iter().cloned().collect(),
            });
        };

        let record = self.record(workflow_id)?;
        let status = self
            .orchestrator
            .get_workflow_status(Some(&record.project_id))?;
        Ok(EngineStatus::Workflow {
            record: Box::new(record.clone()),
            status,
        })
    }

    pub fn generate_workflow_report(&self, workflow_id: &str) -> Result<WorkflowReport> {
        let record = self.record(workflow_id)?;
        let project = self
            .orchestrator
            .project(&record.project_id)
            .ok_or_else(|| WorkflowError::not_found(EntityKind::Project, &record.project_id))?;
        let stories = self.orchestrator.stories_for(&record.project_id);
        Ok(build_report(record, project, &stories, Utc::now()))
    }

    // ---------------------------------------------------------------------
    // Persistence
    // ---------------------------------------------------------------------

    pub fn snapshot(&self, workflow_id: &str) -> Result<WorkflowSnapshot> {
        let record = self.record(workflow_id)?;
        let project = self
            .orchestrator
            .project(&record.project_id)
            .ok_or_else(|| WorkflowError::not_found(EntityKind::Project, &record.project_id))?;

        Ok(WorkflowSnapshot {
            record: record.clone(),
            project: project.clone(),
            session: self.orchestrator.session_for(&record.project_id).cloned(),
            stories: self
                .orchestrator
                .stories_for(&record.project_id)
                .into_iter()
                .cloned()
                .collect(),
        })
    }

    fn persist(&mut self, workflow_id: &str) -> Result<()> {
        let snapshot = self.snapshot(workflow_id)?;
        match self.store.put(workflow_id, &snapshot) {
            Ok(()) => {
                self.dirty.remove(workflow_id);
                debug!(workflow_id, "Workflow persisted");
                Ok(())
            }
            Err(e) => {
                self.dirty.insert(workflow_id.to_string());
                warn!(workflow_id, "Failed to persist workflow: {e:#}");
                Err(WorkflowError::Persistence {
                    workflow_id: workflow_id.to_string(),
                    message: format!("{e:#}"),
                })
            }
        }
    }

    /// Retry every workflow whose last write failed. Every pending workflow
    /// is attempted; the first failure is returned after the sweep.
    pub fn flush(&mut self) -> Result<usize> {
        let pending: Vec<String> = self.dirty.iter().cloned().collect();
        let mut written = 0;
        let mut first_error = None;
        for workflow_id in &pending {
            match self.persist(workflow_id) {
                Ok(()) => written += 1,
                Err(e) if first_error.is_none() => first_error = Some(e),
                Err(_) => {}
            }
        }
        if written > 0 {
            info!(workflows = written, "Flushed pending workflows");
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(written),
        }
    }

    /// Persist, then evaluate automation. The persistence result is
    /// returned after automation has run.
    fn settle(&mut self, workflow_id: &str) -> Result<()> {
        let persisted = self.persist(workflow_id);
        self.run_automation(workflow_id);
        persisted
    }

    /// A rejected transition may still have appended to gate history, so it
    /// settles like any other mutation before the rejection is returned.
    fn settle_rejection(&mut self, workflow_id: &str, rejection: WorkflowError) -> WorkflowError {
        if let Err(e) = self.settle(workflow_id) {
            warn!(workflow_id, rejection = %rejection, "Rejected transition left unsaved: {e}");
        }
        rejection
    }

    fn fire(&mut self, event: WorkflowEvent) {
        let failures = self.bus.publish(&event);
        self.metrics.events_fired += 1;
        self.metrics.listener_failures += failures as u64;
    }

    // ---------------------------------------------------------------------
    // Automation
    // ---------------------------------------------------------------------

    fn run_automation(&mut self, workflow_id: &str) {
        if self.rules.is_empty() {
            return;
        }
        if self.automation_depth >= self.max_depth {
            warn!(workflow_id, depth = self.automation_depth, "Automation depth limit reached");
            return;
        }

        let context = match self.record(workflow_id).map(serde_json::to_value) {
            Ok(Ok(context)) => context,
            Ok(Err(e)) => {
                warn!(workflow_id, "Failed to serialize workflow for automation: {e}");
                return;
            }
            Err(_) => return,
        };
        let matching: Vec<AutomationRule> = self
            .rules
            .iter()
            .filter(|rule| rule.matches(&context))
            .cloned()
            .collect();
        if matching.is_empty() {
            return;
        }

        self.automation_depth += 1;
        let depth = self.automation_depth;
        for rule in matching {
            info!(workflow_id, rule = %rule.name, action = %rule.action, depth, "Automation rule triggered");
            let error = self
                .execute_action(workflow_id, &rule.action)
                .err()
                .map(|e| e.to_string());
            if let Some(error) = &error {
                warn!(workflow_id, rule = %rule.name, "Automation action failed: {error}");
            }

            self.metrics.automation_triggers += 1;
            if let Ok(record) = self.record_mut(workflow_id) {
                record.automation_events.push(AutomationEvent {
                    rule: rule.name.clone(),
                    action: rule.action.to_string(),
                    depth,
                    succeeded: error.is_none(),
                    error,
                    triggered_at: Utc::now(),
                });
            }
        }
        self.automation_depth -= 1;

        // automation events are part of the record
        if let Err(e) = self.persist(workflow_id) {
            warn!(workflow_id, "Automation events left unsaved: {e}");
        }
    }

    fn execute_action(&mut self, workflow_id: &str, action: &AutomationAction) -> Result<()> {
        match action {
            AutomationAction::Advance { target } => self
                .advance_workflow(workflow_id, target.as_deref(), None)
                .map(|_| ()),
            AutomationAction::AssignAgent { task_type, role } => {
                let story_id = self.record(workflow_id)?.current_story_id.clone();
                self.assign(workflow_id, task_type, story_id.as_deref(), *role)
                    .map(|_| ())
            }
            AutomationAction::RunQualityGate { gate } => {
                let story_id = self.record(workflow_id)?.current_story_id.clone().ok_or_else(
                    || WorkflowError::NoActiveStory {
                        workflow_id: workflow_id.to_string(),
                    },
                )?;
                self.gate_run(workflow_id, &story_id, *gate, false).map(|_| ())
            }
        }
    }
}

impl std::fmt::Debug for WorkflowEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowEngine")
            .field("workflows", &self.records.len())
            .field("rules", &self.rules.len())
            .field("bus", &self.bus)
            .field("dirty", &self.dirty)
            .finish()
    }
}
