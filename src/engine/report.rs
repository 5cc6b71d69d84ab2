use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::automation::AutomationEvent;
use super::record::WorkflowRecord;
use crate::gates::GateRecord;
use crate::models::project::ProjectContext;
use crate::models::roles::Role;
use crate::models::state::{ProjectState, StoryState};
use crate::models::story::StoryContext;

const STALLED_PLANNING_DAYS: i64 = 14;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GateSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
}

impl GateSummary {
    fn tally<'a>(records: impl Iterator<Item = &'a GateRecord>) -> Self {
        records.fold(Self::default(), |mut acc, r| {
            acc.total += 1;
            if r.level.allows_commit() {
                acc.passed += 1;
            } else {
                acc.failed += 1;
            }
            acc
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowReport {
    pub report_id: String,
    pub workflow_id: String,
    pub project_id: String,
    pub project_name: String,
    pub generated_at: DateTime<Utc>,
    pub started_at: DateTime<Utc>,
    pub duration_seconds: i64,
    pub duration: String,
    pub current_state: ProjectState,
    pub completion_percentage: f64,
    pub estimated_duration: String,
    pub stories_total: usize,
    pub stories_completed: usize,
    pub gates: GateSummary,
    pub role_interactions: BTreeMap<Role, u64>,
    pub last_agent: Option<Role>,
    pub automation_events: Vec<AutomationEvent>,
    pub recommendations: Vec<String>,
}

/// Compose a report as of `now`.
pub fn build_report(
    record: &WorkflowRecord,
    project: &ProjectContext,
    stories: &[&StoryContext],
    now: DateTime<Utc>,
) -> WorkflowReport {
    let elapsed = now - record.started_at;
    let gates = GateSummary::tally(
        project
            .gate_history
            .iter()
            .chain(stories.iter().flat_map(|s| s.gate_history.iter())),
    );

    let mut recommendations = Vec::new();
    if elapsed.num_days() > STALLED_PLANNING_DAYS
        && matches!(
            project.state,
            ProjectState::IdeaGeneration | ProjectState::AnalystResearch
        )
    {
        recommendations.push(
            "Consider accelerating planning phase - project has been in early stages for over 2 weeks"
                .to_string(),
        );
    }
    if gates.failed > 0 {
        recommendations.push(format!(
            "Address {} failed quality gates before proceeding",
            gates.failed
        ));
    }

    WorkflowReport {
        report_id: format!("report-{}-{}", record.workflow_id, now.timestamp()),
        workflow_id: record.workflow_id.clone(),
        project_id: project.id.clone(),
        project_name: project.name.clone(),
        generated_at: now,
        started_at: record.started_at,
        duration_seconds: elapsed.num_seconds(),
        duration: format_duration(elapsed),
        current_state: project.state,
        completion_percentage: record.plan.completion_percentage(project.state),
        estimated_duration: record.plan.estimated_duration.clone(),
        stories_total: stories.len(),
        stories_completed: stories
            .iter()
            .filter(|s| s.state == StoryState::Completed)
            .count(),
        gates,
        role_interactions: record.agent_interactions.clone(),
        last_agent: record.last_agent,
        automation_events: record.automation_events.clone(),
        recommendations,
    }
}

fn format_duration(elapsed: chrono::Duration) -> String {
    let days = elapsed.num_days();
    let hours = elapsed.num_hours() % 24;
    let minutes = elapsed.num_minutes() % 60;
    if days > 0 {
        format!("{days}d {hours}h {minutes}m")
    } else if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}
