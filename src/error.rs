//! Error taxonomy for workflow operations
//!
//! Every failure a caller can observe is a variant here and carries the data
//! needed to recover (the legal alternatives, the missing artifacts, the gate
//! verdict, the allowed command set). Nothing in the core panics on bad input.

use thiserror::Error;

use crate::gates::GateVerdict;
use crate::models::project::ArtifactSlot;
use crate::models::roles::Role;

pub type Result<T, E = WorkflowError> = std::result::Result<T, E>;

/// What kind of record a lookup was looking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Project,
    Story,
    Session,
    Task,
    Workflow,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::Project => write!(f, "project"),
            EntityKind::Story => write!(f, "story"),
            EntityKind::Session => write!(f, "session"),
            EntityKind::Task => write!(f, "task"),
            EntityKind::Workflow => write!(f, "workflow"),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum WorkflowError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: String },

    #[error("Invalid transition from {from} to {to} (legal: {})", .legal.join(", "))]
    InvalidTransition {
        from: String,
        to: String,
        legal: Vec<String>,
    },

    #[error("Unknown state: {value}")]
    InvalidState { value: String },

    #[error("No valid next states available from {from}")]
    NoNextState { from: String },

    #[error("Prerequisites not met for {target}: missing {}", format_slots(.missing))]
    PrerequisiteUnmet {
        target: String,
        missing: Vec<ArtifactSlot>,
        recommendations: Vec<String>,
    },

    #[error("Project {project_id} is in {state}; stories require one of: {}", .allowed.join(", "))]
    WrongProjectState {
        project_id: String,
        state: String,
        allowed: Vec<String>,
    },

    #[error("Quality gate blocked transition to {target}: {}", .verdict.issues.join("; "))]
    GateBlocked { target: String, verdict: GateVerdict },

    #[error("Quality gate failed for transition to {target}: {}", .verdict.issues.join("; "))]
    GateFailed { target: String, verdict: GateVerdict },

    #[error("Unknown role: {name}")]
    UnknownRole { name: String },

    #[error("Command {command} not available for {role} (allowed: {})", .allowed.join(", "))]
    CommandNotAllowed {
        role: Role,
        command: String,
        allowed: Vec<String>,
    },

    #[error("Workflow {workflow_id} has no active story")]
    NoActiveStory { workflow_id: String },

    #[error("Failed to persist workflow {workflow_id}: {message}")]
    Persistence { workflow_id: String, message: String },
}

fn format_slots(slots: &[ArtifactSlot]) -> String {
    slots
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl WorkflowError {
    pub fn not_found(kind: EntityKind, id: impl Into<String>) -> Self {
        WorkflowError::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// The gate verdict attached to a gate failure, if this is one.
    pub fn verdict(&self) -> Option<&GateVerdict> {
        match self {
            WorkflowError::GateBlocked { verdict, .. } | WorkflowError::GateFailed { verdict, .. } => {
                Some(verdict)
            }
            _ => None,
        }
    }

    /// Legal alternatives attached to an invalid transition.
    pub fn legal_alternatives(&self) -> Option<&[String]> {
        match self {
            WorkflowError::InvalidTransition { legal, .. } => Some(legal),
            _ => None,
        }
    }
}
