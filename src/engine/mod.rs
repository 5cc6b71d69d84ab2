//! Workflow Engine
//!
//! Wraps the orchestrator with execution plans, a synchronous event bus,
//! automation rules, per-workflow persistence and reporting.

mod automation;
mod events;
mod plan;
mod record;
mod report;
mod workflow;

pub use automation::{AutomationAction, AutomationEvent, AutomationRule};
pub use events::{EventBus, EventLog, Listener, WorkflowEvent, WorkflowEventKind};
pub use plan::{ExecutionPlan, PlanPhase, WorkflowType};
pub use record::{GateRun, RecordStatus, WorkflowRecord, WorkflowSnapshot};
pub use report::{build_report, GateSummary, WorkflowReport};
pub use workflow::{
    AgentCommandResult, EngineMetrics, EngineStatus, WorkflowAdvance, WorkflowEngine,
    WorkflowStarted, WorkflowSummary,
};
