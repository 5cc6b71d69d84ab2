//! Synchronous event bus.
//!
//! Listeners run in registration order on the caller's thread. A failing
//! listener is logged and skipped; it never fails the operation that fired
//! the event.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::fs::locking::locked_append_line;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowEventKind {
    ProjectCreated,
    ProjectStateChanged,
    StoryCreated,
    StoryStateChanged,
    AgentAssigned,
    QualityGateChecked,
    WorkflowCompleted,
}

impl WorkflowEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowEventKind::ProjectCreated => "project_created",
            WorkflowEventKind::ProjectStateChanged => "project_state_changed",
            WorkflowEventKind::StoryCreated => "story_created",
            WorkflowEventKind::StoryStateChanged => "story_state_changed",
            WorkflowEventKind::AgentAssigned => "agent_assigned",
            WorkflowEventKind::QualityGateChecked => "quality_gate_checked",
            WorkflowEventKind::WorkflowCompleted => "workflow_completed",
        }
    }
}

impl std::fmt::Display for WorkflowEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowEvent {
    #[serde(rename = "event")]
    pub kind: WorkflowEventKind,
    pub workflow_id: String,
    pub project_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub story_id: Option<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl WorkflowEvent {
    pub fn new(kind: WorkflowEventKind, workflow_id: &str, project_id: &str) -> Self {
        Self {
            kind,
            workflow_id: workflow_id.to_string(),
            project_id: project_id.to_string(),
            story_id: None,
            timestamp: Utc::now(),
            data: serde_json::Value::Null,
        }
    }

    pub fn with_story(mut self, story_id: impl Into<String>) -> Self {
        self.story_id = Some(story_id.into());
        self
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = data;
        self
    }
}

pub type Listener = Box<dyn Fn(&WorkflowEvent) -> Result<()> + Send + Sync>;

#[derive(Default)]
pub struct EventBus {
    listeners: Vec<(Option<WorkflowEventKind>, Listener)>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Listen to one kind of event.
    pub fn subscribe(&mut self, kind: WorkflowEventKind, listener: Listener) {
        self.listeners.push((Some(kind), listener));
    }

    /// Listen to every event.
    pub fn subscribe_all(&mut self, listener: Listener) {
        self.listeners.push((None, listener));
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Deliver an event, returning how many listeners failed.
    pub fn publish(&self, event: &WorkflowEvent) -> usize {
        let mut failures = 0;
        for (filter, listener) in &self.listeners {
            if filter.is_some_and(|kind| kind != event.kind) {
                continue;
            }
            if let Err(e) = listener(event) {
                failures += 1;
                warn!(
                    event = %event.kind,
                    workflow_id = %event.workflow_id,
                    "Event listener failed: {e:#}"
                );
            }
        }
        debug!(event = %event.kind, workflow_id = %event.workflow_id, failures, "Event published");
        failures
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

/// JSONL file receiving one line per event.
#[derive(Debug, Clone)]
pub struct EventLog {
    path: PathBuf,
}

impl EventLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, event: &WorkflowEvent) -> Result<()> {
        let line = serde_json::to_string(event).context("Failed to serialize event")?;
        locked_append_line(&self.path, &line)
    }

    pub fn listener(self) -> Listener {
        Box::new(move |event| self.append(event))
    }

    /// Read back the last `limit` events, oldest first.
    pub fn read_recent(&self, limit: usize) -> Result<Vec<WorkflowEvent>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = crate::fs::locking::locked_read(&self.path)?;
        let mut events = content
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(|l| {
                serde_json::from_str(l)
                    .with_context(|| format!("Malformed event in {}", self.path.display()))
            })
            .collect::<Result<Vec<WorkflowEvent>>>()?;
        let skip = events.len().saturating_sub(limit);
        Ok(events.split_off(skip))
    }
}
